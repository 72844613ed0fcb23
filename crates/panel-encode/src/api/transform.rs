//! Raster transform capabilities.
//!
//! The two image-processing stages sit behind traits so an implementation
//! can run in-process (the defaults in this crate) or hand the work to an
//! external program behind the same contract.

use image::RgbImage;

use super::EncodeError;
use crate::palette::Palette;

/// Turns encoded image bytes into a canvas-sized RGB raster.
pub trait Normalize: Send + Sync {
    /// Decode `encoded` and fit it onto the canvas.
    ///
    /// Undecodable input fails with [`EncodeError::Decode`], resampling
    /// failures with [`EncodeError::Resize`].
    fn normalize(&self, encoded: &[u8]) -> Result<RgbImage, EncodeError>;
}

/// Reduces a raster to palette colors.
pub trait Quantize: Send + Sync {
    /// Return a raster of the same size in which every pixel is one of the
    /// palette's RGB values. Failures are [`EncodeError::Quantize`].
    fn quantize(&self, raster: &RgbImage, palette: &Palette) -> Result<RgbImage, EncodeError>;
}
