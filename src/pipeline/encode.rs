//! JPEG encoding and page file naming.
//!
//! Each page is encoded fully in memory first, then written to a temporary
//! file in the destination directory and renamed into place. A crash or a
//! full disk therefore never leaves a half-written `_N.jpg` behind for the
//! host to pick up.

use crate::error::Pdf2ImageError;
use crate::pipeline::composite::Composited;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output path for page `index` (0-based):
/// `<destination without extension>_<index + 1>.jpg`.
pub fn page_output_path(destination: &Path, index: usize) -> PathBuf {
    let mut name = destination.with_extension("").into_os_string();
    name.push(format!("_{}.jpg", index + 1));
    PathBuf::from(name)
}

/// Encode `img` as a baseline JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)?;
    debug!("Encoded {}x{} → {} bytes JPEG", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Encode a composited page and atomically write it to `path`.
pub fn write_page(page: &Composited, path: &Path, quality: u8) -> Result<(), Pdf2ImageError> {
    let fail = |detail: String| Pdf2ImageError::EncodeFailed {
        path: path.to_path_buf(),
        detail,
    };

    let bytes = encode_jpeg(&page.to_rgb(), quality).map_err(|e| fail(e.to_string()))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| fail(format!("create {}: {e}", dir.display())))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| fail(e.to_string()))?;
    tmp.write_all(&bytes).map_err(|e| fail(e.to_string()))?;
    tmp.persist(path).map_err(|e| fail(e.error.to_string()))?;

    Ok(())
}
