//! Transparency flattening.
//!
//! JPEG has no alpha channel. A page whose every pixel is fully opaque is
//! passed through untouched; anything else is composited over opaque white
//! into a fresh RGB buffer. Pixels below [`ALPHA_THRESHOLD`] become pure
//! white rather than a faint tint of their colour, which keeps
//! anti-aliasing fringes from showing up as grey haze in the JPEG.

use crate::pipeline::render::PixelBuffer;
use image::{Rgb, RgbImage};
use tracing::debug;

/// Alpha values strictly below this become pure white.
pub const ALPHA_THRESHOLD: u8 = 32;

/// Result of compositing a rendered page.
#[derive(Debug, Clone, PartialEq)]
pub enum Composited {
    /// Every pixel was opaque; the buffer is exactly what the rasteriser made.
    Opaque(PixelBuffer),
    /// At least one pixel was transparent; blended onto white, alpha dropped.
    Flattened(RgbImage),
}

impl Composited {
    /// The opaque RGB image to encode. Dropping alpha from an opaque buffer
    /// loses nothing.
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            Composited::Flattened(img) => img.clone(),
            Composited::Opaque(buf) => RgbImage::from_fn(buf.width(), buf.height(), |x, y| {
                let [r, g, b, _] = buf.pixel(x, y);
                Rgb([r, g, b])
            }),
        }
    }
}

/// Whether any pixel has alpha below 255.
pub fn has_transparency(buf: &PixelBuffer) -> bool {
    buf.rows()
        .any(|row| row.chunks_exact(4).any(|px| px[3] < u8::MAX))
}

/// Source-over blend of one channel against white:
/// `floor(c·a/255 + 255·(1 − a/255))`, exact in integer arithmetic.
pub fn blend_over_white(channel: u8, alpha: u8) -> u8 {
    let (c, a) = (channel as u32, alpha as u32);
    ((c * a + 255 * (255 - a)) / 255) as u8
}

/// Flatten every pixel of `buf` onto white.
pub fn flatten_onto_white(buf: &PixelBuffer) -> RgbImage {
    RgbImage::from_fn(buf.width(), buf.height(), |x, y| {
        let [r, g, b, a] = buf.pixel(x, y);
        if a < ALPHA_THRESHOLD {
            Rgb([255, 255, 255])
        } else {
            Rgb([
                blend_over_white(r, a),
                blend_over_white(g, a),
                blend_over_white(b, a),
            ])
        }
    })
}

/// Pass an opaque buffer through, flatten anything else.
pub fn composite(buf: PixelBuffer) -> Composited {
    if has_transparency(&buf) {
        debug!("Transparency found, flattening onto white");
        Composited::Flattened(flatten_onto_white(&buf))
    } else {
        Composited::Opaque(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_buffer_passes_through_byte_for_byte() {
        let mut buf = PixelBuffer::filled(3, 2, [10, 20, 30, 255]);
        buf.set_pixel(1, 1, [200, 100, 0, 255]);
        let before = buf.clone();

        match composite(buf) {
            Composited::Opaque(out) => assert_eq!(out, before),
            other => panic!("expected pass-through, got {other:?}"),
        }
    }

    #[test]
    fn single_translucent_pixel_flattens_whole_page() {
        let mut buf = PixelBuffer::filled(2, 2, [10, 20, 30, 255]);
        buf.set_pixel(0, 0, [0, 0, 0, 254]);
        let Composited::Flattened(img) = composite(buf) else {
            panic!("expected flattening");
        };
        assert_eq!(img.dimensions(), (2, 2));
        // Opaque pixels keep their colour through the blend.
        assert_eq!(img.get_pixel(1, 1), &Rgb([10, 20, 30]));
        // 0·254/255 + 255·1/255 = 1.
        assert_eq!(img.get_pixel(0, 0), &Rgb([1, 1, 1]));
    }

    #[test]
    fn below_threshold_is_pure_white() {
        let mut buf = PixelBuffer::filled(3, 1, [255, 255, 255, 255]);
        buf.set_pixel(0, 0, [0, 0, 0, 0]);
        buf.set_pixel(1, 0, [255, 0, 0, 31]);
        buf.set_pixel(2, 0, [0, 0, 0, 32]);
        let img = flatten_onto_white(&buf);
        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([255, 255, 255]));
        // At the threshold the blend applies: 255 * 223 / 255 = 223.
        assert_eq!(img.get_pixel(2, 0), &Rgb([223, 223, 223]));
    }

    #[test]
    fn blend_endpoints_and_midpoint() {
        assert_eq!(blend_over_white(37, 255), 37);
        assert_eq!(blend_over_white(0, 0), 255);
        // 0·128/255 + 255·127/255 = 127 exactly.
        assert_eq!(blend_over_white(0, 128), 127);
        // 100·128/255 + 127 = 177.196… → 177
        assert_eq!(blend_over_white(100, 128), 177);
        assert_eq!(blend_over_white(255, 128), 255);
    }

    #[test]
    fn opaque_to_rgb_drops_alpha_only() {
        let mut buf = PixelBuffer::filled(2, 1, [1, 2, 3, 255]);
        buf.set_pixel(1, 0, [4, 5, 6, 255]);
        let rgb = Composited::Opaque(buf).to_rgb();
        assert_eq!(rgb.as_raw(), &vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn opaque_to_rgb_skips_row_padding() {
        // 2×2 with 4 bytes of padding per row.
        let data = vec![
            1, 2, 3, 255, 4, 5, 6, 255, 9, 9, 9, 9, //
            7, 8, 9, 255, 10, 11, 12, 255, 9, 9, 9, 9,
        ];
        let buf = PixelBuffer::new(2, 2, 12, data).unwrap();
        let rgb = Composited::Opaque(buf).to_rgb();
        assert_eq!(rgb.dimensions(), (2, 2));
        assert_eq!(
            rgb.as_raw(),
            &vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]
        );
    }
}
