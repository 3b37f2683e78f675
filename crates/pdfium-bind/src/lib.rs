//! # pdfium-bind
//!
//! Locate and bind the [PDFium](https://pdfium.googlesource.com/pdfium/)
//! shared library that an installer drops beside the executable, so that
//! `pdfium-render` callers never need to set `LD_LIBRARY_PATH` / `PATH`.
//!
//! ## Search order
//!
//! 1. `PDFIUM_LIB_PATH` — explicit path to an existing library file.
//! 2. `<exe-dir>/<arch>/` — per-architecture folder (`x64`, `x86`, `arm64`),
//!    the layout used by the Windows installer.
//! 3. `<exe-dir>/` — flat install.
//! 4. The system library search path.
//!
//! The first candidate that exists on disk is bound; a candidate that exists
//! but fails to load is reported immediately rather than silently skipped,
//! since a broken install should not quietly fall back to another copy.
//!
//! ```rust,no_run
//! use pdfium_bind::bind_pdfium;
//!
//! let exe_dir = std::env::current_exe().ok().and_then(|p| p.parent().map(|d| d.to_path_buf()));
//! let pdfium = bind_pdfium(exe_dir.as_deref()).expect("PDFium unavailable");
//! ```

use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// Environment variable naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned while binding PDFium.
#[derive(Error, Debug)]
pub enum PdfiumBindError {
    /// A library file was found but `libloading` / `pdfium-render` rejected it.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },

    /// No candidate existed and the system library could not be bound either.
    #[error("PDFium library not found (tried {tried:?}); system library: {reason}")]
    NotFound { tried: Vec<PathBuf>, reason: String },
}

// ── Platform metadata ────────────────────────────────────────────────────────

/// Name of the per-architecture sub-folder the installer uses.
///
/// Returns `None` on architectures that have no dedicated folder; those
/// installs are expected to be flat.
pub fn arch_dir_name() -> Option<&'static str> {
    match std::env::consts::ARCH {
        "x86_64" => Some("x64"),
        "x86" => Some("x86"),
        "aarch64" => Some("arm64"),
        _ => None,
    }
}

/// Ordered list of library files to try, excluding the system fallback.
///
/// Candidates are returned whether or not they exist; [`bind_pdfium`] skips
/// the missing ones.
pub fn candidate_paths(exe_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(p) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        if !p.is_empty() {
            candidates.push(PathBuf::from(p));
        }
    }

    if let Some(dir) = exe_dir {
        if let Some(arch) = arch_dir_name() {
            candidates.push(Pdfium::pdfium_platform_library_name_at_path(&dir.join(arch)));
        }
        candidates.push(Pdfium::pdfium_platform_library_name_at_path(dir));
    }

    candidates
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Binds to PDFium using the search order described in the crate docs.
pub fn bind_pdfium(exe_dir: Option<&Path>) -> Result<Pdfium, PdfiumBindError> {
    let tried = candidate_paths(exe_dir);

    if let Some(found) = tried.iter().find(|p| p.exists()) {
        return bind_pdfium_from_path(found);
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| PdfiumBindError::NotFound {
            tried,
            reason: e.to_string(),
        })
}

/// Binds to a PDFium library at an explicit `path`.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumBindError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumBindError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
