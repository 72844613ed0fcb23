//! Floyd-Steinberg error diffusion dithering.

use image::RgbImage;

use super::{dither_with_kernel, FLOYD_STEINBERG};
use crate::api::{EncodeError, Quantize};
use crate::palette::Palette;

/// Floyd-Steinberg error diffusion quantizer.
///
/// For each pixel in row-major, left-to-right order: pick the nearest
/// palette color (squared Euclidean RGB, palette-order tie-break), emit it,
/// and push the per-channel error to unvisited neighbors:
///
/// ```text
///        X   7
///    3   5   1
/// ```
///
/// Weights are sixteenths. Receiving channels are clamped to [0, 255].
///
/// # Example
///
/// ```
/// use panel_encode::{FloydSteinberg, Palette, Quantize};
/// use image::{Rgb, RgbImage};
///
/// let raster = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
/// let dithered = FloydSteinberg.quantize(&raster, &Palette::panel()).unwrap();
/// assert!(dithered.pixels().all(|p| p.0 == [255, 0, 0]));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FloydSteinberg;

impl Quantize for FloydSteinberg {
    fn quantize(&self, raster: &RgbImage, palette: &Palette) -> Result<RgbImage, EncodeError> {
        dither_with_kernel(raster, palette, &FLOYD_STEINBERG)
    }
}
