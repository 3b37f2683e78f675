//! Document session: the one open document of a job.
//!
//! The session owns the engine's document handle and hands out page handles
//! one at a time through [`DocumentSession::with_page`], which drops the
//! page before returning whatever the closure produced. Pages therefore
//! never overlap and a page is released even when rendering it fails.

use crate::engine::{EngineDocument, EngineError, EnginePage, RenderingEngine};
use crate::error::{OpenFailure, Pdf2ImageError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct DocumentSession<'e> {
    document: Box<dyn EngineDocument + 'e>,
    path: PathBuf,
}

impl<'e> DocumentSession<'e> {
    /// Open `path` with the optional password.
    pub fn open(
        engine: &'e dyn RenderingEngine,
        path: &Path,
        password: Option<&'e str>,
    ) -> Result<Self, Pdf2ImageError> {
        let document = engine.open(path, password).map_err(|e| {
            let kind = match (&e, password) {
                (EngineError::Password(_), Some(_)) => OpenFailure::WrongPassword,
                (EngineError::Password(_), None) => OpenFailure::PasswordRequired,
                (EngineError::Failed(_), _) => OpenFailure::Other,
            };
            Pdf2ImageError::DocumentOpenFailed {
                path: path.to_path_buf(),
                kind,
                detail: e.to_string(),
            }
        })?;

        info!("Opened {} ({} pages)", path.display(), document.page_count());
        Ok(Self {
            document,
            path: path.to_path_buf(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    /// Load page `index`, run `f` on it, release the page.
    pub fn with_page<T>(
        &self,
        index: usize,
        f: impl FnOnce(&dyn EnginePage) -> Result<T, Pdf2ImageError>,
    ) -> Result<T, Pdf2ImageError> {
        let page = self
            .document
            .load_page(index)
            .map_err(|e| Pdf2ImageError::RenderFailed {
                page: index + 1,
                detail: format!("cannot load page: {e}"),
            })?;
        let result = f(page.as_ref());
        drop(page);
        debug!("Released page {}", index + 1);
        result
    }
}

impl Drop for DocumentSession<'_> {
    fn drop(&mut self) {
        debug!("Closing document {}", self.path.display());
    }
}
