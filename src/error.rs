//! Error types for the pdf2image library.
//!
//! Every failure past argument parsing is terminal for the job: there is no
//! retry anywhere in the pipeline. The variants mirror the stage that failed
//! so the binary can pick the right host notification, and
//! [`Pdf2ImageError::reason_tag`] maps each one to the optional tag that
//! follows `FAIL` in the status string.

use std::path::PathBuf;
use thiserror::Error;

/// Why a document could not be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    /// The document is encrypted and no password was supplied.
    PasswordRequired,
    /// A password was supplied but the engine rejected it.
    WrongPassword,
    /// Corrupt file, unreadable path, unsupported format.
    Other,
}

/// All fatal errors returned by the pdf2image library.
#[derive(Debug, Error)]
pub enum Pdf2ImageError {
    // ── Argument / config errors ──────────────────────────────────────────
    /// Positional arguments do not match any supported shape.
    #[error("Invalid arguments: {0}")]
    ArgumentInvalid(String),

    /// The settings file exists but could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Rights-management errors ──────────────────────────────────────────
    /// The rights agent is not running or the user is not logged in.
    #[error("Rights agent unavailable: {detail}")]
    AgentUnavailable { detail: String },

    /// The agent could not tell whether the file is protected.
    #[error("Protection check failed for '{path}': {detail}")]
    ProtectionCheckFailed { path: PathBuf, detail: String },

    /// The agent failed to produce a decrypted copy.
    #[error("Decryption of '{path}' into '{target}' failed: {detail}")]
    DecryptionFailed {
        path: PathBuf,
        target: PathBuf,
        detail: String,
    },

    /// Staging an unprotected file into its working copy failed.
    #[error("Failed to copy '{path}' to '{target}': {source}")]
    CopyFailed {
        path: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The pdfium shared library could not be located or bound.
    #[error("Failed to bind to pdfium library: {0}")]
    EngineUnavailable(String),

    /// The engine refused to open the document.
    #[error("Cannot open PDF '{path}' ({kind:?}): {detail}")]
    DocumentOpenFailed {
        path: PathBuf,
        kind: OpenFailure,
        detail: String,
    },

    /// Rasterisation of a page failed; pages before it are already on disk.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The JPEG for a page could not be encoded or written.
    #[error("Failed to write page image '{path}': {detail}")]
    EncodeFailed { path: PathBuf, detail: String },
}

impl Pdf2ImageError {
    /// Tag appended after `FAIL` in the host status string, if any.
    ///
    /// The host shows a password prompt for `PASSWORD` and a rights-management
    /// message for `DRM`; everything else is a generic failure.
    pub fn reason_tag(&self) -> Option<&'static str> {
        match self {
            Pdf2ImageError::DocumentOpenFailed {
                kind: OpenFailure::PasswordRequired | OpenFailure::WrongPassword,
                ..
            } => Some("PASSWORD"),
            Pdf2ImageError::AgentUnavailable { .. }
            | Pdf2ImageError::ProtectionCheckFailed { .. }
            | Pdf2ImageError::DecryptionFailed { .. } => Some("DRM"),
            _ => None,
        }
    }

    /// Whether the host should be told about this failure at all.
    pub fn notifies_host(&self) -> bool {
        !matches!(self, Pdf2ImageError::ArgumentInvalid(_))
    }
}
