//! [`RenderingEngine`] backed by `pdfium-render`.
//!
//! pdfium keeps thread-local state, but the pipeline is strictly sequential,
//! so every call here happens on the main thread. Failures are surfaced as
//! [`EngineError`]s; nothing is swallowed inside the engine layer.

use super::{EngineDocument, EngineError, EnginePage, PageSize, RawBitmap, RenderingEngine};
use crate::error::Pdf2ImageError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// The production engine: a bound pdfium library.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    pub fn new(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }

    /// Locate and bind pdfium relative to the executable directory.
    pub fn bind(exe_dir: Option<&Path>) -> Result<Self, Pdf2ImageError> {
        let pdfium = pdfium_bind::bind_pdfium(exe_dir)
            .map_err(|e| Pdf2ImageError::EngineUnavailable(e.to_string()))?;
        info!("pdfium bound");
        Ok(Self::new(pdfium))
    }
}

impl RenderingEngine for PdfiumEngine {
    fn open<'e>(
        &'e self,
        path: &Path,
        password: Option<&'e str>,
    ) -> Result<Box<dyn EngineDocument + 'e>, EngineError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    EngineError::Password(err_str)
                } else {
                    EngineError::Failed(err_str)
                }
            })?;
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl EngineDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn load_page<'d>(&'d self, index: usize) -> Result<Box<dyn EnginePage + 'd>, EngineError> {
        let idx = u16::try_from(index)
            .map_err(|_| EngineError::Failed(format!("page index {index} exceeds pdfium range")))?;
        let page = self
            .document
            .pages()
            .get(idx)
            .map_err(|e| EngineError::Failed(format!("{:?}", e)))?;
        Ok(Box::new(PdfiumPage { page }))
    }
}

impl Drop for PdfiumDocument<'_> {
    fn drop(&mut self) {
        debug!("Closing pdfium document");
    }
}

struct PdfiumPage<'a> {
    page: PdfPage<'a>,
}

impl EnginePage for PdfiumPage<'_> {
    fn size(&self) -> PageSize {
        PageSize {
            width: self.page.width().value,
            height: self.page.height().value,
        }
    }

    fn render_bgra(&self, width: u32, height: u32) -> Result<RawBitmap, EngineError> {
        let render_config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32)
            .set_format(PdfBitmapFormat::BGRA)
            // pdfium-render asks for RGBA byte order by default.
            .set_reverse_byte_order(false)
            .set_clear_color(PdfColor::WHITE)
            .render_annotations(true)
            .use_lcd_text_rendering(true);

        let bitmap = self
            .page
            .render_with_config(&render_config)
            .map_err(|e| EngineError::Failed(format!("{:?}", e)))?;

        let bgra = bitmap.as_raw_bytes();
        let (w, h) = (bitmap.width() as u32, bitmap.height() as u32);
        if h == 0 {
            return Err(EngineError::Failed("engine returned an empty bitmap".into()));
        }
        let stride = bgra.len() / h as usize;

        Ok(RawBitmap {
            width: w,
            height: h,
            stride,
            bgra,
        })
    }
}
