//! Page rasterisation: one engine page → one RGBA [`PixelBuffer`].
//!
//! ## Pixel size
//!
//! PDF pages are measured in points (1/72 inch). At resolution multiplier
//! `r` a page renders at `96 × r` DPI, so each dimension becomes
//! `round(points × 96r / 72)` pixels. Geometry reported back to the host
//! uses the same formula with `r = 1` regardless of the render multiplier;
//! see [`reference_extent`].
//!
//! ## Channel order
//!
//! pdfium hands back blue-green-red-alpha. Everything downstream of this
//! module works in red-green-blue-alpha, so the swap happens here, in place,
//! before the buffer leaves the rasteriser.

use crate::engine::{EnginePage, PageSize, RawBitmap};
use crate::error::Pdf2ImageError;
use tracing::debug;

/// Pixels per inch at resolution multiplier 1.0.
pub const REFERENCE_DPI: f64 = 96.0;

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// An RGBA, row-major pixel buffer for a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap RGBA bytes. `stride` is bytes per row and must cover `width * 4`.
    pub fn new(width: u32, height: u32, stride: usize, data: Vec<u8>) -> Option<Self> {
        let row = width as usize * 4;
        if stride < row || data.len() < stride * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Tightly packed buffer filled with a single colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            stride: width as usize * 4,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate over rows, each trimmed to exactly `width * 4` bytes.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row = self.width as usize * 4;
        self.data
            .chunks(self.stride)
            .take(self.height as usize)
            .map(move |r| &r[..row])
    }

    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let at = y as usize * self.stride + x as usize * 4;
        [
            self.data[at],
            self.data[at + 1],
            self.data[at + 2],
            self.data[at + 3],
        ]
    }

    /// Overwrite the pixel at `(x, y)`.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let at = y as usize * self.stride + x as usize * 4;
        self.data[at..at + 4].copy_from_slice(&rgba);
    }

    /// Build from an engine bitmap, swapping BGRA to RGBA.
    pub fn from_bgra(bitmap: RawBitmap) -> Option<Self> {
        let mut buffer = Self::new(bitmap.width, bitmap.height, bitmap.stride, bitmap.bgra)?;
        let row = buffer.width as usize * 4;
        for line in buffer.data.chunks_mut(buffer.stride).take(buffer.height as usize) {
            bgra_to_rgba(&mut line[..row]);
        }
        Some(buffer)
    }
}

/// Swap the blue and red channel of every 4-byte pixel in place.
pub fn bgra_to_rgba(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

/// Pixels spanned by `points` at resolution multiplier `multiplier`.
pub fn pixel_extent(points: f32, multiplier: f32) -> u32 {
    let px = (points as f64 * REFERENCE_DPI * multiplier as f64 / POINTS_PER_INCH).round();
    px.max(1.0) as u32
}

/// Pixels spanned by `points` at the fixed 96 DPI reference.
pub fn reference_extent(points: f32) -> u32 {
    pixel_extent(points, 1.0)
}

/// Rasterise one page at `multiplier`. `index` is 0-based and only used for
/// error reporting.
pub fn rasterize_page(
    page: &dyn EnginePage,
    index: usize,
    multiplier: f32,
) -> Result<(PageSize, PixelBuffer), Pdf2ImageError> {
    let size = page.size();
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !valid(size.width) || !valid(size.height) {
        return Err(Pdf2ImageError::RenderFailed {
            page: index + 1,
            detail: format!("invalid page size {} x {} pt", size.width, size.height),
        });
    }

    let width = pixel_extent(size.width, multiplier);
    let height = pixel_extent(size.height, multiplier);
    debug!(
        "Rendering page {}: {}x{} pt → {}x{} px",
        index + 1,
        size.width,
        size.height,
        width,
        height
    );

    let bitmap = page
        .render_bgra(width, height)
        .map_err(|e| Pdf2ImageError::RenderFailed {
            page: index + 1,
            detail: e.to_string(),
        })?;

    let buffer = PixelBuffer::from_bgra(bitmap).ok_or_else(|| Pdf2ImageError::RenderFailed {
        page: index + 1,
        detail: "engine returned a truncated bitmap".into(),
    })?;

    Ok((size, buffer))
}
