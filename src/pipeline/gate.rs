//! Resource Gate: decide what file the engine actually opens.
//!
//! ## State machine (agent-mediated scheme)
//!
//! ```text
//! agent running? ──no──▶ AgentUnavailable
//!      │yes
//! protected? ──error──▶ ProtectionCheckFailed
//!   │yes          │no
//! decrypt        copy            (both into <source><WORKING_COPY_SUFFIX>)
//!   │err──▶ DecryptionFailed   │err──▶ CopyFailed
//!   ▼                          ▼
//!        WorkingFile { origin: DecryptedCopy }
//! ```
//!
//! The engine only ever opens the sibling copy, so the caller's file is never
//! touched whether or not it was protected. The copy is removed when the
//! [`WorkingFile`] is dropped; removal failures are logged and otherwise
//! ignored.

use crate::config::{Job, ProtectionScheme};
use crate::error::Pdf2ImageError;
use crate::rights::RightsAgent;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Appended to the source file name to form the working copy.
pub const WORKING_COPY_SUFFIX: &str = ".decrypted";

/// Where a [`WorkingFile`] came from; decides whether it is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The caller's own file.
    Unmodified,
    /// A staged copy the caller asked for (single-file mode). Kept.
    OriginalCopy,
    /// A gate-owned decrypted or copied sibling. Deleted on drop.
    DecryptedCopy,
}

/// The path handed to the rendering engine, plus its cleanup duty.
#[derive(Debug)]
pub struct WorkingFile {
    path: PathBuf,
    origin: Origin,
    released: bool,
}

impl WorkingFile {
    fn new(path: PathBuf, origin: Origin) -> Self {
        Self {
            path,
            origin,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Delete the file now if the gate owns it. Returns whether a file was
    /// removed. Errors are logged, never returned.
    pub fn release(mut self) -> bool {
        self.cleanup()
    }

    fn cleanup(&mut self) -> bool {
        if self.released || self.origin != Origin::DecryptedCopy {
            return false;
        }
        self.released = true;

        if !self.path.exists() {
            return false;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed working copy {}", self.path.display());
                true
            }
            Err(e) => {
                warn!("Could not remove working copy {}: {}", self.path.display(), e);
                false
            }
        }
    }
}

impl Drop for WorkingFile {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Sibling path used for the agent-mediated working copy.
pub fn working_copy_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(WORKING_COPY_SUFFIX);
    PathBuf::from(name)
}

pub struct ResourceGate<'a> {
    scheme: ProtectionScheme,
    agent: &'a dyn RightsAgent,
}

impl<'a> ResourceGate<'a> {
    pub fn new(scheme: ProtectionScheme, agent: &'a dyn RightsAgent) -> Self {
        Self { scheme, agent }
    }

    /// Produce the working file for a PDF conversion job.
    pub fn acquire(&self, job: &Job) -> Result<WorkingFile, Pdf2ImageError> {
        match self.scheme {
            ProtectionScheme::None => {
                Ok(WorkingFile::new(job.source.clone(), Origin::Unmodified))
            }
            ProtectionScheme::Reserved => {
                warn!("Protection scheme 2 is reserved; opening the source as-is");
                Ok(WorkingFile::new(job.source.clone(), Origin::Unmodified))
            }
            ProtectionScheme::AgentMediated => {
                self.ensure_agent()?;
                // Guard first: a half-written copy is removed on the error path too.
                let working =
                    WorkingFile::new(working_copy_path(&job.source), Origin::DecryptedCopy);
                self.unprotect_into(&job.source, working.path())?;
                Ok(working)
            }
        }
    }

    /// Single-file mode: stage `source` at the caller's `target` and keep it.
    pub fn stage(&self, source: &Path, target: &Path) -> Result<WorkingFile, Pdf2ImageError> {
        match self.scheme {
            ProtectionScheme::AgentMediated => self.unprotect_into(source, target)?,
            ProtectionScheme::None | ProtectionScheme::Reserved => copy_verbatim(source, target)?,
        }
        Ok(WorkingFile::new(target.to_path_buf(), Origin::OriginalCopy))
    }

    fn ensure_agent(&self) -> Result<(), Pdf2ImageError> {
        match self.agent.is_running() {
            Ok(true) => {
                info!("Rights agent is running and authenticated");
                Ok(())
            }
            Ok(false) => Err(Pdf2ImageError::AgentUnavailable {
                detail: "agent not running or user not logged in".into(),
            }),
            Err(e) => Err(Pdf2ImageError::AgentUnavailable {
                detail: e.to_string(),
            }),
        }
    }

    /// Steps shared by both modes: check protection, then decrypt or copy.
    fn unprotect_into(&self, source: &Path, target: &Path) -> Result<(), Pdf2ImageError> {
        let protected =
            self.agent
                .is_protected(source)
                .map_err(|e| Pdf2ImageError::ProtectionCheckFailed {
                    path: source.to_path_buf(),
                    detail: e.to_string(),
                })?;

        if protected {
            info!("{} is protected, decrypting to {}", source.display(), target.display());
            self.agent
                .decrypt(source, target)
                .map_err(|e| Pdf2ImageError::DecryptionFailed {
                    path: source.to_path_buf(),
                    target: target.to_path_buf(),
                    detail: e.to_string(),
                })
        } else {
            info!("{} is not protected, copying to {}", source.display(), target.display());
            copy_verbatim(source, target)
        }
    }
}

fn copy_verbatim(source: &Path, target: &Path) -> Result<(), Pdf2ImageError> {
    std::fs::copy(source, target)
        .map(|_| ())
        .map_err(|e| Pdf2ImageError::CopyFailed {
            path: source.to_path_buf(),
            target: target.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JobMode, Settings};
    use crate::rights::AgentError;
    use std::cell::RefCell;

    /// Scriptable agent that records which calls were made.
    #[derive(Default)]
    struct ScriptedAgent {
        down: bool,
        protected: Option<bool>,
        decrypt_fails: bool,
        /// Leave a partial target behind before failing.
        partial_write: bool,
        calls: RefCell<Vec<&'static str>>,
    }

    impl RightsAgent for ScriptedAgent {
        fn is_running(&self) -> Result<bool, AgentError> {
            self.calls.borrow_mut().push("running");
            Ok(!self.down)
        }

        fn is_protected(&self, _path: &Path) -> Result<bool, AgentError> {
            self.calls.borrow_mut().push("check");
            self.protected.ok_or_else(|| AgentError("check timed out".into()))
        }

        fn decrypt(&self, source: &Path, target: &Path) -> Result<(), AgentError> {
            self.calls.borrow_mut().push("decrypt");
            if self.decrypt_fails {
                if self.partial_write {
                    std::fs::write(target, b"%PDF-pla").map_err(|e| AgentError(e.to_string()))?;
                }
                return Err(AgentError("license expired".into()));
            }
            let mut bytes = std::fs::read(source).map_err(|e| AgentError(e.to_string()))?;
            bytes.extend_from_slice(b"-plain");
            std::fs::write(target, bytes).map_err(|e| AgentError(e.to_string()))
        }
    }

    fn job_for(source: &Path) -> Job {
        Job::builder(JobMode::PdfConversion, source, "out.jpg", &Settings::default())
            .build()
            .unwrap()
    }

    fn source_in(dir: &Path) -> PathBuf {
        let p = dir.join("in.pdf");
        std::fs::write(&p, b"%PDF").unwrap();
        p
    }

    #[test]
    fn no_scheme_uses_source_and_never_deletes_it() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_in(dir.path());
        let agent = ScriptedAgent::default();
        let gate = ResourceGate::new(ProtectionScheme::None, &agent);

        let wf = gate.acquire(&job_for(&src)).unwrap();
        assert_eq!(wf.path(), src.as_path());
        assert_eq!(wf.origin(), Origin::Unmodified);
        assert!(!wf.release());
        assert!(src.exists());
        assert!(agent.calls.borrow().is_empty());
    }

    #[test]
    fn reserved_scheme_is_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_in(dir.path());
        let agent = ScriptedAgent::default();
        let wf = ResourceGate::new(ProtectionScheme::Reserved, &agent)
            .acquire(&job_for(&src))
            .unwrap();
        assert_eq!(wf.origin(), Origin::Unmodified);
        drop(wf);
        assert!(src.exists());
    }

    #[test]
    fn agent_down_aborts_before_any_file_work() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_in(dir.path());
        let agent = ScriptedAgent {
            down: true,
            ..Default::default()
        };
        let err = ResourceGate::new(ProtectionScheme::AgentMediated, &agent)
            .acquire(&job_for(&src))
            .unwrap_err();
        assert!(matches!(err, Pdf2ImageError::AgentUnavailable { .. }));
        assert_eq!(*agent.calls.borrow(), vec!["running"]);
        assert!(!working_copy_path(&src).exists());
    }

    #[test]
    fn protected_file_is_decrypted_into_sibling_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_in(dir.path());
        let agent = ScriptedAgent {
            protected: Some(true),
            ..Default::default()
        };
        let wf = ResourceGate::new(ProtectionScheme::AgentMediated, &agent)
            .acquire(&job_for(&src))
            .unwrap();

        let sibling = dir.path().join("in.pdf.decrypted");
        assert_eq!(wf.path(), sibling.as_path());
        assert_eq!(wf.origin(), Origin::DecryptedCopy);
        assert_eq!(std::fs::read(&sibling).unwrap(), b"%PDF-plain");

        drop(wf);
        assert!(!sibling.exists());
        assert_eq!(std::fs::read(&src).unwrap(), b"%PDF");
    }

    #[test]
    fn unprotected_file_is_copied_and_still_scheduled_for_deletion() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_in(dir.path());
        let agent = ScriptedAgent {
            protected: Some(false),
            ..Default::default()
        };
        let wf = ResourceGate::new(ProtectionScheme::AgentMediated, &agent)
            .acquire(&job_for(&src))
            .unwrap();
        assert_eq!(wf.origin(), Origin::DecryptedCopy);
        assert_eq!(std::fs::read(wf.path()).unwrap(), b"%PDF");
        assert_eq!(*agent.calls.borrow(), vec!["running", "check"]);
        assert!(wf.release());
        assert!(src.exists());
    }

    #[test]
    fn check_and_decrypt_failures_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_in(dir.path());

        let agent = ScriptedAgent::default();
        let err = ResourceGate::new(ProtectionScheme::AgentMediated, &agent)
            .acquire(&job_for(&src))
            .unwrap_err();
        assert!(matches!(err, Pdf2ImageError::ProtectionCheckFailed { .. }));

        let agent = ScriptedAgent {
            protected: Some(true),
            decrypt_fails: true,
            ..Default::default()
        };
        let err = ResourceGate::new(ProtectionScheme::AgentMediated, &agent)
            .acquire(&job_for(&src))
            .unwrap_err();
        assert!(matches!(err, Pdf2ImageError::DecryptionFailed { .. }));
    }

    #[test]
    fn partial_decrypt_output_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_in(dir.path());
        let agent = ScriptedAgent {
            protected: Some(true),
            decrypt_fails: true,
            partial_write: true,
            ..Default::default()
        };
        let err = ResourceGate::new(ProtectionScheme::AgentMediated, &agent)
            .acquire(&job_for(&src))
            .unwrap_err();
        assert!(matches!(err, Pdf2ImageError::DecryptionFailed { .. }));
        assert!(!working_copy_path(&src).exists());
        assert!(src.exists());
    }

    #[test]
    fn copy_failure_for_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let agent = ScriptedAgent {
            protected: Some(false),
            ..Default::default()
        };
        let err = ResourceGate::new(ProtectionScheme::AgentMediated, &agent)
            .acquire(&job_for(&dir.path().join("missing.pdf")))
            .unwrap_err();
        assert!(matches!(err, Pdf2ImageError::CopyFailed { .. }));
    }

    #[test]
    fn single_file_staging_skips_agent_status_and_keeps_result() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_in(dir.path());
        let target = dir.path().join("staged.png");
        let agent = ScriptedAgent {
            protected: Some(true),
            ..Default::default()
        };

        let wf = ResourceGate::new(ProtectionScheme::AgentMediated, &agent)
            .stage(&src, &target)
            .unwrap();
        assert_eq!(wf.origin(), Origin::OriginalCopy);
        assert!(!wf.release());
        assert_eq!(std::fs::read(&target).unwrap(), b"%PDF-plain");
        assert_eq!(*agent.calls.borrow(), vec!["check", "decrypt"]);
    }

    #[test]
    fn single_file_staging_without_scheme_copies() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_in(dir.path());
        let target = dir.path().join("copy.pdf");
        let agent = ScriptedAgent::default();
        ResourceGate::new(ProtectionScheme::None, &agent)
            .stage(&src, &target)
            .unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"%PDF");
        assert!(agent.calls.borrow().is_empty());
    }

    #[test]
    fn already_removed_working_copy_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_in(dir.path());
        let agent = ScriptedAgent {
            protected: Some(false),
            ..Default::default()
        };
        let wf = ResourceGate::new(ProtectionScheme::AgentMediated, &agent)
            .acquire(&job_for(&src))
            .unwrap();
        std::fs::remove_file(wf.path()).unwrap();
        assert!(!wf.release());
    }
}
