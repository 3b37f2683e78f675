//! Fakes shared by the integration tests.

#![allow(dead_code)]

use pdf2image::engine::{
    EngineDocument, EngineError, EnginePage, PageSize, RawBitmap, RenderingEngine,
};
use pdf2image::rights::{AgentError, RightsAgent};
use pdf2image::{JobStatus, Notifier};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

// ── Engine ───────────────────────────────────────────────────────────────

/// One page of a fake document.
#[derive(Debug, Clone)]
pub struct FakePage {
    pub width: f32,
    pub height: f32,
    /// Fill colour as the engine reports it: blue, green, red, alpha.
    pub bgra: [u8; 4],
    pub fail: bool,
}

impl FakePage {
    pub fn opaque(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            bgra: [40, 80, 160, 255],
            fail: false,
        }
    }

    pub fn with_bgra(mut self, bgra: [u8; 4]) -> Self {
        self.bgra = bgra;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

/// An in-memory engine that counts every handle it gives out.
///
/// `open` requires the path to exist on disk, so tests observe exactly which
/// file the pipeline asked for.
#[derive(Debug, Default)]
pub struct FakeEngine {
    pub pages: Vec<FakePage>,
    pub password: Option<String>,
    pub fail_open: bool,
    pub opened: Cell<usize>,
    pub closed: Cell<usize>,
    pub pages_loaded: Cell<usize>,
    pub pages_released: Cell<usize>,
    pub live_pages: Cell<usize>,
    pub max_live_pages: Cell<usize>,
    pub opened_paths: RefCell<Vec<PathBuf>>,
}

impl FakeEngine {
    pub fn with_pages(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }
}

impl RenderingEngine for FakeEngine {
    fn open<'e>(
        &'e self,
        path: &Path,
        password: Option<&'e str>,
    ) -> Result<Box<dyn EngineDocument + 'e>, EngineError> {
        self.opened_paths.borrow_mut().push(path.to_path_buf());
        if !path.exists() {
            return Err(EngineError::Failed(format!("{} not found", path.display())));
        }
        if self.fail_open {
            return Err(EngineError::Failed("not a PDF".into()));
        }
        if let Some(expected) = &self.password {
            if password != Some(expected.as_str()) {
                return Err(EngineError::Password("incorrect password".into()));
            }
        }
        self.opened.set(self.opened.get() + 1);
        Ok(Box::new(FakeDocument { engine: self }))
    }
}

struct FakeDocument<'e> {
    engine: &'e FakeEngine,
}

impl EngineDocument for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.engine.pages.len()
    }

    fn load_page<'d>(&'d self, index: usize) -> Result<Box<dyn EnginePage + 'd>, EngineError> {
        let page = self
            .engine
            .pages
            .get(index)
            .ok_or_else(|| EngineError::Failed(format!("no page {index}")))?;
        let e = self.engine;
        e.pages_loaded.set(e.pages_loaded.get() + 1);
        e.live_pages.set(e.live_pages.get() + 1);
        e.max_live_pages
            .set(e.max_live_pages.get().max(e.live_pages.get()));
        Ok(Box::new(FakePageHandle { engine: e, page }))
    }
}

impl Drop for FakeDocument<'_> {
    fn drop(&mut self) {
        self.engine.closed.set(self.engine.closed.get() + 1);
    }
}

struct FakePageHandle<'d> {
    engine: &'d FakeEngine,
    page: &'d FakePage,
}

impl EnginePage for FakePageHandle<'_> {
    fn size(&self) -> PageSize {
        PageSize {
            width: self.page.width,
            height: self.page.height,
        }
    }

    fn render_bgra(&self, width: u32, height: u32) -> Result<RawBitmap, EngineError> {
        if self.page.fail {
            return Err(EngineError::Failed("corrupt content stream".into()));
        }
        // Padded rows, like real engines produce for odd widths.
        let stride = width as usize * 4 + 8;
        let mut bgra = vec![0u8; stride * height as usize];
        for row in bgra.chunks_mut(stride) {
            for px in row[..width as usize * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&self.page.bgra);
            }
        }
        Ok(RawBitmap {
            width,
            height,
            stride,
            bgra,
        })
    }
}

impl Drop for FakePageHandle<'_> {
    fn drop(&mut self) {
        let e = self.engine;
        e.pages_released.set(e.pages_released.get() + 1);
        e.live_pages.set(e.live_pages.get() - 1);
    }
}

// ── Rights agent ─────────────────────────────────────────────────────────

/// Agent whose answers are fixed up front. `decrypt` copies the bytes with
/// a marker prefix so tests can tell a decrypted copy from a plain one.
#[derive(Debug, Default)]
pub struct FakeAgent {
    pub running: bool,
    pub protected: bool,
    pub check_fails: bool,
    pub decrypt_fails: bool,
    /// Write part of the target before `decrypt` fails.
    pub partial_write: bool,
    pub calls: RefCell<Vec<String>>,
}

pub const DECRYPTED_MARKER: &[u8] = b"DECRYPTED:";

impl FakeAgent {
    pub fn running(protected: bool) -> Self {
        Self {
            running: true,
            protected,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl RightsAgent for FakeAgent {
    fn is_running(&self) -> Result<bool, AgentError> {
        self.calls.borrow_mut().push("status".into());
        Ok(self.running)
    }

    fn is_protected(&self, _path: &Path) -> Result<bool, AgentError> {
        self.calls.borrow_mut().push("check".into());
        if self.check_fails {
            return Err(AgentError("check failed".into()));
        }
        Ok(self.protected)
    }

    fn decrypt(&self, source: &Path, target: &Path) -> Result<(), AgentError> {
        self.calls.borrow_mut().push("decrypt".into());
        if self.decrypt_fails {
            if self.partial_write {
                std::fs::write(target, DECRYPTED_MARKER).map_err(|e| AgentError(e.to_string()))?;
            }
            return Err(AgentError("license expired".into()));
        }
        let mut bytes = DECRYPTED_MARKER.to_vec();
        bytes.extend(std::fs::read(source).map_err(|e| AgentError(e.to_string()))?);
        std::fs::write(target, bytes).map_err(|e| AgentError(e.to_string()))
    }
}

// ── Notifier ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|(_, s)| s.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, app_code: &str, status: &JobStatus) {
        self.sent
            .borrow_mut()
            .push((app_code.to_string(), status.to_string()));
    }
}

// ── Files ────────────────────────────────────────────────────────────────

/// Write a placeholder source document; the fake engine only checks that
/// the file exists.
pub fn write_source(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.7 placeholder").unwrap();
    path
}

/// Sorted names of every file in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
