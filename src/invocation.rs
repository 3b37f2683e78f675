//! Positional command-line shapes.
//!
//! The host launches the converter with a fixed number of positional
//! arguments; the count alone selects the mode:
//!
//! | Count | Shape |
//! |------:|-------|
//! | 0 | defaults: `test.pdf` → `converted.jpg` in the executable directory |
//! | 2 | `<source> <destination>` — single-file staging |
//! | 3 | `<pdf> <image-template> <app-code>` |
//! | 4 | … `<resolution-multiplier>` |
//! | 5 | … `<password>` |

use crate::config::{Job, JobMode, Settings};
use crate::error::Pdf2ImageError;
use std::path::{Path, PathBuf};

pub const USAGE: &str =
    "USAGE : pdf2image [pdf_filename img_filename [app_code [resolution [password]]]]";

pub const DEFAULT_SOURCE: &str = "test.pdf";
pub const DEFAULT_DESTINATION: &str = "converted.jpg";

/// A recognised argument shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Defaults,
    SingleFile {
        source: PathBuf,
        destination: PathBuf,
    },
    Pdf {
        source: PathBuf,
        destination: PathBuf,
        app_code: String,
        resolution: Option<f32>,
        password: Option<String>,
    },
}

impl Invocation {
    /// Classify positional arguments (program name excluded).
    pub fn from_args(args: &[String]) -> Result<Self, Pdf2ImageError> {
        match args {
            [] => Ok(Invocation::Defaults),
            [source, destination] => Ok(Invocation::SingleFile {
                source: source.into(),
                destination: destination.into(),
            }),
            [source, destination, app_code, rest @ ..] if rest.len() <= 2 => {
                let resolution = rest.first().map(|r| parse_resolution(r)).transpose()?;
                Ok(Invocation::Pdf {
                    source: source.into(),
                    destination: destination.into(),
                    app_code: app_code.clone(),
                    resolution,
                    password: rest.get(1).cloned(),
                })
            }
            other => Err(Pdf2ImageError::ArgumentInvalid(format!(
                "{} positional arguments; {USAGE}",
                other.len()
            ))),
        }
    }

    /// Resolve into a [`Job`]. Defaults are taken relative to `exe_dir`.
    pub fn into_job(self, settings: &Settings, exe_dir: &Path) -> Result<Job, Pdf2ImageError> {
        match self {
            Invocation::Defaults => Job::builder(
                JobMode::PdfConversion,
                exe_dir.join(DEFAULT_SOURCE),
                exe_dir.join(DEFAULT_DESTINATION),
                settings,
            )
            .build(),
            Invocation::SingleFile {
                source,
                destination,
            } => Job::builder(JobMode::SingleFileStaging, source, destination, settings).build(),
            Invocation::Pdf {
                source,
                destination,
                app_code,
                resolution,
                password,
            } => {
                let mut builder = Job::builder(JobMode::PdfConversion, source, destination, settings)
                    .app_code(app_code);
                if let Some(r) = resolution {
                    builder = builder.resolution(r);
                }
                if let Some(p) = password {
                    builder = builder.password(p);
                }
                builder.build()
            }
        }
    }
}

/// Parse a resolution multiplier. `str::parse` always uses `.` as the
/// decimal separator, whatever the system locale.
fn parse_resolution(raw: &str) -> Result<f32, Pdf2ImageError> {
    let value: f32 = raw.trim().parse().map_err(|_| {
        Pdf2ImageError::ArgumentInvalid(format!("resolution '{raw}' is not a number"))
    })?;
    if !(value.is_finite() && value > 0.0) {
        return Err(Pdf2ImageError::ArgumentInvalid(format!(
            "resolution must be positive, got {raw}"
        )));
    }
    Ok(value)
}
