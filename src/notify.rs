//! Host notification.
//!
//! The host editor learns the outcome of a job by being launched with the
//! status as its command line: `<host> pdf2image SUCCESS 816,816 1056,1056`.
//! The launch is fire-and-forget; if it fails there is nobody left to tell,
//! so the failure is only logged.

use crate::config::Settings;
use crate::report::JobStatus;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{error, info};

/// First argument of every host launch; identifies the sender.
pub const COMMAND_TOKEN: &str = "pdf2image";

/// Directory name the host is installed under.
pub const INSTALL_MARKER: &str = "UBIReport4Inst";

/// Delivers the final status to the host.
pub trait Notifier {
    fn notify(&self, app_code: &str, status: &JobStatus);
}

/// Launches the host executable resolved from the working directory.
#[derive(Debug, Clone)]
pub struct HostLauncher {
    working_dir: PathBuf,
    settings: Settings,
}

impl HostLauncher {
    pub fn new(working_dir: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            working_dir: working_dir.into(),
            settings,
        }
    }

    /// Host executable for `app_code`.
    ///
    /// When the working directory already lies inside the install folder the
    /// executable sits right there; otherwise it is in
    /// `<working dir>/UBIReport4Inst/`.
    pub fn host_path(&self, app_code: &str) -> PathBuf {
        let exe = format!(
            "{}{}",
            self.settings.host_for(app_code),
            std::env::consts::EXE_SUFFIX
        );
        let inside_install = self.working_dir.to_string_lossy().contains(INSTALL_MARKER);
        if inside_install {
            self.working_dir.join(exe)
        } else {
            self.working_dir.join(INSTALL_MARKER).join(exe)
        }
    }

    /// Full argument vector passed to the host.
    pub fn host_args(status: &JobStatus) -> Vec<String> {
        let mut args = vec![COMMAND_TOKEN.to_string()];
        args.extend(status.tokens());
        args
    }
}

impl Notifier for HostLauncher {
    fn notify(&self, app_code: &str, status: &JobStatus) {
        let host = self.host_path(app_code);
        info!("Notifying {}: {}", host.display(), status);
        if let Err(e) = launch(&host, &Self::host_args(status)) {
            error!("Could not launch {}: {}", host.display(), e);
        }
    }
}

fn launch(program: &Path, args: &[String]) -> std::io::Result<()> {
    // The child is intentionally not waited on.
    Command::new(program).args(args).spawn().map(|_| ())
}
