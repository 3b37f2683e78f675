//! Rendering-engine capability interface.
//!
//! The pipeline never talks to pdfium directly. It sees three small traits:
//!
//! ```text
//! RenderingEngine ──open──▶ EngineDocument ──load_page──▶ EnginePage
//!                           (closed on drop)              (closed on drop)
//! ```
//!
//! Handle release is tied to `Drop`, so a document or page is closed exactly
//! once on every exit path, early `?` returns included. The production
//! implementation lives in [`pdfium`]; tests plug in in-memory fakes.

pub mod pdfium;

use std::path::Path;
use thiserror::Error;

pub use self::pdfium::PdfiumEngine;

/// Native page size in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// A bitmap exactly as the engine produced it: blue-green-red-alpha bytes.
#[derive(Debug, Clone)]
pub struct RawBitmap {
    pub width: u32,
    pub height: u32,
    /// Bytes per row; at least `width * 4`.
    pub stride: usize,
    pub bgra: Vec<u8>,
}

/// Failure reported by the engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The document is encrypted and the password was missing or wrong.
    #[error("password rejected: {0}")]
    Password(String),

    #[error("{0}")]
    Failed(String),
}

/// Entry point of a rendering engine.
pub trait RenderingEngine {
    /// Open `path`; the returned handle closes the document when dropped.
    /// The password is borrowed for as long as the document stays open.
    fn open<'e>(
        &'e self,
        path: &Path,
        password: Option<&'e str>,
    ) -> Result<Box<dyn EngineDocument + 'e>, EngineError>;
}

/// An opened document.
pub trait EngineDocument {
    fn page_count(&self) -> usize;

    /// Load page `index` (0-based); the handle closes the page when dropped.
    fn load_page<'d>(&'d self, index: usize) -> Result<Box<dyn EnginePage + 'd>, EngineError>;
}

/// A loaded page.
pub trait EnginePage {
    fn size(&self) -> PageSize;

    /// Paint the whole page into a `width` × `height` bitmap pre-filled with
    /// opaque white, annotations included.
    fn render_bgra(&self, width: u32, height: u32) -> Result<RawBitmap, EngineError>;
}
