//! Settings and job description.
//!
//! Two layers feed a run:
//!
//! * [`Settings`] — the installer-managed JSON file read once at startup
//!   (resolution level, JPEG quality, protection scheme, host executables).
//!   A missing file means "all defaults"; a malformed one is an error.
//! * [`Job`] — the immutable description of this single invocation, built
//!   from the resolved positional arguments plus the settings via
//!   [`Job::builder`].

use crate::error::Pdf2ImageError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Settings file looked up in the executable directory.
pub const SETTINGS_FILE_NAME: &str = "pdf2image.json";

/// JPEG quality used when the configured factor is outside `(0, 1]`.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Host executable stem used for app codes without an explicit entry.
pub const DEFAULT_HOST: &str = "MySuit Editor";

// ── Protection scheme ────────────────────────────────────────────────────

/// How the input file must be treated before it can be opened.
///
/// Read from the integer selector in the settings file
/// (`0` none, `1` agent-mediated, `2` reserved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "u8")]
pub enum ProtectionScheme {
    /// Open the caller's file directly.
    #[default]
    None,
    /// Ask the rights agent to decrypt (or copy) into a working copy first.
    AgentMediated,
    /// Extension point; currently behaves like [`ProtectionScheme::None`].
    Reserved,
}

impl TryFrom<u8> for ProtectionScheme {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ProtectionScheme::None),
            1 => Ok(ProtectionScheme::AgentMediated),
            2 => Ok(ProtectionScheme::Reserved),
            other => Err(format!("unknown protection scheme {other} (expected 0, 1 or 2)")),
        }
    }
}

// ── Settings ─────────────────────────────────────────────────────────────

/// Installer-managed settings, read once per process.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Render resolution multiplier; `1.0` renders at 96 DPI.
    /// Overridden by the fourth positional argument.
    pub resolution_level: f32,

    /// JPEG quality factor in `(0, 1]`. Anything else selects quality 80.
    pub image_quality: f32,

    /// Protection scheme applied to every input.
    pub protection_scheme: ProtectionScheme,

    /// Rights-agent executable used by [`ProtectionScheme::AgentMediated`].
    pub agent_program: PathBuf,

    /// Arguments passed to the agent before each subcommand.
    pub agent_args: Vec<String>,

    /// App code assumed when the command line does not carry one.
    pub default_app_code: String,

    /// App code → host executable stem. Codes not listed use [`DEFAULT_HOST`].
    pub hosts: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut hosts = BTreeMap::new();
        hosts.insert("001".to_string(), "UBIFORM Editor".to_string());
        Self {
            resolution_level: 1.0,
            image_quality: 0.8,
            protection_scheme: ProtectionScheme::None,
            agent_program: PathBuf::from("drm-agent"),
            agent_args: Vec::new(),
            default_app_code: "002".to_string(),
            hosts,
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, Pdf2ImageError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(Pdf2ImageError::InvalidConfig(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };

        let settings: Settings = serde_json::from_str(&text).map_err(|e| {
            Pdf2ImageError::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })?;
        if !(settings.resolution_level.is_finite() && settings.resolution_level > 0.0) {
            return Err(Pdf2ImageError::InvalidConfig(format!(
                "resolution_level in {} must be a positive number, got {}",
                path.display(),
                settings.resolution_level
            )));
        }
        debug!("Loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    /// Host executable stem for an app code.
    pub fn host_for(&self, app_code: &str) -> &str {
        self.hosts
            .get(app_code)
            .map(String::as_str)
            .unwrap_or(DEFAULT_HOST)
    }
}

// ── Job ──────────────────────────────────────────────────────────────────

/// What the invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    /// Rasterise every page of a PDF into JPEG files.
    PdfConversion,
    /// Stage (decrypt or copy) a single file and stop.
    SingleFileStaging,
}

/// One invocation's worth of work. Immutable once built.
#[derive(Debug, Clone)]
pub struct Job {
    pub mode: JobMode,
    /// Caller-supplied input. Never modified or deleted.
    pub source: PathBuf,
    /// Image path template (PDF mode) or staging target (single-file mode).
    pub destination: PathBuf,
    pub app_code: String,
    /// Render resolution multiplier, always positive and finite.
    pub resolution: f32,
    /// Raw quality factor; see [`jpeg_quality`].
    pub quality_factor: f32,
    pub password: Option<String>,
    pub protection: ProtectionScheme,
}

impl Job {
    /// Start a builder seeded from `settings`.
    pub fn builder(
        mode: JobMode,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        settings: &Settings,
    ) -> JobBuilder {
        JobBuilder {
            job: Job {
                mode,
                source: source.into(),
                destination: destination.into(),
                app_code: settings.default_app_code.clone(),
                resolution: settings.resolution_level,
                quality_factor: settings.image_quality,
                password: None,
                protection: settings.protection_scheme,
            },
        }
    }

    /// JPEG quality derived from the configured factor.
    pub fn jpeg_quality(&self) -> u8 {
        jpeg_quality(self.quality_factor)
    }
}

/// Builder for [`Job`].
#[derive(Debug)]
pub struct JobBuilder {
    job: Job,
}

impl JobBuilder {
    pub fn app_code(mut self, code: impl Into<String>) -> Self {
        self.job.app_code = code.into();
        self
    }

    pub fn resolution(mut self, multiplier: f32) -> Self {
        self.job.resolution = multiplier;
        self
    }

    pub fn quality_factor(mut self, factor: f32) -> Self {
        self.job.quality_factor = factor;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.job.password = Some(pwd.into());
        self
    }

    pub fn protection(mut self, scheme: ProtectionScheme) -> Self {
        self.job.protection = scheme;
        self
    }

    /// Build the job, validating constraints.
    pub fn build(self) -> Result<Job, Pdf2ImageError> {
        let j = &self.job;
        if j.source.as_os_str().is_empty() || j.destination.as_os_str().is_empty() {
            return Err(Pdf2ImageError::ArgumentInvalid(
                "source and destination paths must not be empty".into(),
            ));
        }
        if !(j.resolution.is_finite() && j.resolution > 0.0) {
            return Err(Pdf2ImageError::ArgumentInvalid(format!(
                "resolution multiplier must be a positive number, got {}",
                j.resolution
            )));
        }
        Ok(self.job)
    }
}

/// Map a quality factor to a JPEG quality in `[1, 100]`.
///
/// Factors outside `(0, 1]` (including NaN) fall back to
/// [`DEFAULT_JPEG_QUALITY`]; they are not clamped.
pub fn jpeg_quality(factor: f32) -> u8 {
    if factor > 0.0 && factor <= 1.0 {
        ((factor * 100.0).round() as u8).max(1)
    } else {
        DEFAULT_JPEG_QUALITY
    }
}
