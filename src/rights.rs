//! Rights-management agent capability.
//!
//! The agent is an external program that runs in the user's session and
//! knows how to check and strip document protection. [`RightsAgent`] is the
//! seam the Resource Gate depends on; [`CommandRightsAgent`] drives a real
//! agent executable through its command-line contract:
//!
//! | Call | Command | Result |
//! |------|---------|--------|
//! | running? | `<agent> status` | exit 0 = running and logged in |
//! | protected? | `<agent> check <path>` | exit 0 = protected, 1 = not protected |
//! | decrypt | `<agent> decrypt <src> <dst>` | exit 0 = success |

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;
use tracing::debug;

/// A failure talking to the agent.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct AgentError(pub String);

/// Operations the Resource Gate needs from a rights agent.
pub trait RightsAgent {
    /// `Ok(true)` when the agent is up and the current user is authenticated.
    fn is_running(&self) -> Result<bool, AgentError>;

    /// Whether `path` carries rights-management protection.
    fn is_protected(&self, path: &Path) -> Result<bool, AgentError>;

    /// Write a decrypted copy of `source` to `target`.
    fn decrypt(&self, source: &Path, target: &Path) -> Result<(), AgentError>;
}

/// Agent reached by spawning its executable synchronously.
#[derive(Debug, Clone)]
pub struct CommandRightsAgent {
    program: PathBuf,
    /// Arguments placed before the subcommand, e.g. a wrapper script path.
    leading_args: Vec<OsString>,
}

impl CommandRightsAgent {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn run(&self, args: &[&OsStr]) -> Result<Output, AgentError> {
        debug!("Running agent {} {:?}", self.program.display(), args);
        Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .output()
            .map_err(|e| AgentError(format!("cannot run {}: {e}", self.program.display())))
    }
}

/// Best description of a finished command: its stderr, or its exit status.
fn describe(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("agent exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

impl RightsAgent for CommandRightsAgent {
    fn is_running(&self) -> Result<bool, AgentError> {
        let output = self.run(&[OsStr::new("status")])?;
        Ok(output.status.success())
    }

    fn is_protected(&self, path: &Path) -> Result<bool, AgentError> {
        let output = self.run(&[OsStr::new("check"), path.as_os_str()])?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(AgentError(describe(&output))),
        }
    }

    fn decrypt(&self, source: &Path, target: &Path) -> Result<(), AgentError> {
        let output = self.run(&[OsStr::new("decrypt"), source.as_os_str(), target.as_os_str()])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(AgentError(describe(&output)))
        }
    }
}
