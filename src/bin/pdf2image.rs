//! CLI binary for pdf2image.
//!
//! Launched by the host editor with positional arguments; see
//! [`pdf2image::invocation`] for the accepted shapes. The process always
//! exits with status 0. The host learns the outcome through the
//! notification launch, and everything else goes to `application_log.txt`
//! next to the executable.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use pdf2image::config::SETTINGS_FILE_NAME;
use pdf2image::engine::RenderingEngine;
use pdf2image::invocation::USAGE;
use pdf2image::rights::CommandRightsAgent;
use pdf2image::{
    report_outcome, run_job, HostLauncher, Invocation, JobMode, PdfiumEngine, Settings,
};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Log file appended to in the executable directory.
const LOG_FILE_NAME: &str = "application_log.txt";

/// Rasterise PDF pages to JPEG and notify the host editor.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2image",
    version,
    about = "Rasterise PDF pages to JPEG and notify the host editor",
    after_help = USAGE
)]
struct Cli {
    /// `[pdf img [app_code [resolution [password]]]]` or `src dst`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,

    /// Settings file (default: pdf2image.json beside the executable).
    #[arg(long, env = "PDF2IMAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long, env = "PDF2IMAGE_VERBOSE")]
    verbose: bool,
}

fn main() -> Result<()> {
    let exe_dir = executable_dir();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }
        Err(e) => {
            init_logging(&exe_dir, false);
            error!("Invalid command line: {}", e.kind());
            error!("{}", USAGE);
            return Ok(());
        }
    };

    init_logging(&exe_dir, cli.verbose);
    info!("pdf2image {} started with {:?}", env!("CARGO_PKG_VERSION"), cli.args);

    // ── Arguments ───────────────────────────────────────────────────────
    let invocation = match Invocation::from_args(&cli.args) {
        Ok(inv) => inv,
        Err(e) => {
            error!("{}", e);
            return Ok(());
        }
    };

    // ── Settings ────────────────────────────────────────────────────────
    let settings_path = cli
        .config
        .clone()
        .unwrap_or_else(|| exe_dir.join(SETTINGS_FILE_NAME));
    let (settings, settings_error) = match Settings::load(&settings_path) {
        Ok(s) => (s, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    let job = match invocation.into_job(&settings, &exe_dir) {
        Ok(job) => job,
        Err(e) => {
            error!("{}", e);
            return Ok(());
        }
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| exe_dir.clone());
    let notifier = HostLauncher::new(cwd, settings.clone());

    if let Some(e) = settings_error {
        report_outcome(&job, Err(e), &notifier);
        return Ok(());
    }

    // ── Engine (PDF mode only) ──────────────────────────────────────────
    let engine = match job.mode {
        JobMode::PdfConversion => match PdfiumEngine::bind(Some(&exe_dir)) {
            Ok(engine) => Some(engine),
            Err(e) => {
                report_outcome(&job, Err(e), &notifier);
                return Ok(());
            }
        },
        JobMode::SingleFileStaging => None,
    };

    // ── Run ─────────────────────────────────────────────────────────────
    let agent = CommandRightsAgent::new(&settings.agent_program)
        .with_leading_args(settings.agent_args.iter());
    let outcome = run_job(
        &job,
        engine.as_ref().map(|e| e as &dyn RenderingEngine),
        &agent,
    );
    report_outcome(&job, outcome, &notifier);

    Ok(())
}

/// Directory holding the running executable, or the working directory when
/// that cannot be determined.
fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Append to the log file beside the executable; fall back to stderr when it
/// cannot be opened.
fn init_logging(exe_dir: &Path, verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let log_path = exe_dir.join(LOG_FILE_NAME);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false);

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => builder.with_writer(Mutex::new(file)).init(),
        Err(_) => builder.with_writer(std::io::stderr).init(),
    }
}
