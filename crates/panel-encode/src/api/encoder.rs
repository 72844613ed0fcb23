//! PanelEncoder builder -- the primary entry point for the crate.

use image::RgbImage;

use super::{EncodeError, Normalize, Quantize};
use crate::dither::FloydSteinberg;
use crate::output::{pack_panel, ColorStatistics, IndexMapper, IndexStream};
use crate::palette::Palette;
use crate::preprocess::CanvasNormalizer;
use crate::{PANEL_HEIGHT, PANEL_PIXELS, PANEL_WIDTH};

/// Encoder from uploaded image bytes to the panel's packed format.
///
/// Each stage is exposed separately so a caller can track progress
/// between them; [`encode()`](Self::encode) runs them all.
///
/// - Constructor requires [`Palette`] (no invalid states)
/// - Stage implementations are swapped with [`normalizer()`](Self::normalizer)
///   and [`quantizer()`](Self::quantizer)
/// - All stage methods take `&self`, so one encoder serves many images
///
/// # Example
///
/// ```
/// use panel_encode::{PanelEncoder, Palette, PACKED_LEN};
/// use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
/// use std::io::Cursor;
///
/// let mut png = Vec::new();
/// DynamicImage::ImageRgb8(RgbImage::from_pixel(800, 480, Rgb([255, 0, 0])))
///     .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
///     .unwrap();
///
/// let encoded = PanelEncoder::new(Palette::panel()).encode(&png).unwrap();
/// assert_eq!(encoded.packed.len(), PACKED_LEN);
/// assert!(encoded.packed.iter().all(|&b| b == 0x33));
/// ```
pub struct PanelEncoder {
    palette: Palette,
    normalizer: Box<dyn Normalize>,
    quantizer: Box<dyn Quantize>,
    mapper: IndexMapper,
}

impl PanelEncoder {
    /// Encoder with in-process Lanczos3 normalization and Floyd-Steinberg
    /// quantization.
    pub fn new(palette: Palette) -> Self {
        let mapper = IndexMapper::new(&palette);
        Self {
            palette,
            normalizer: Box::new(CanvasNormalizer::panel()),
            quantizer: Box::new(FloydSteinberg),
            mapper,
        }
    }

    /// Replace the normalization stage.
    pub fn normalizer(mut self, normalizer: impl Normalize + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    /// Replace the quantization stage.
    pub fn quantizer(mut self, quantizer: impl Quantize + 'static) -> Self {
        self.quantizer = Box::new(quantizer);
        self
    }

    /// The palette all stages use.
    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Decode and fit onto the panel canvas.
    ///
    /// A normalizer that returns anything other than a panel-sized raster
    /// is reported as [`EncodeError::Resize`].
    pub fn normalize(&self, encoded: &[u8]) -> Result<RgbImage, EncodeError> {
        let raster = self.normalizer.normalize(encoded)?;
        if raster.dimensions() != (PANEL_WIDTH, PANEL_HEIGHT) {
            return Err(EncodeError::Resize(format!(
                "normalized raster is {}x{}, expected {}x{}",
                raster.width(),
                raster.height(),
                PANEL_WIDTH,
                PANEL_HEIGHT
            )));
        }
        Ok(raster)
    }

    /// Reduce the raster to palette colors.
    pub fn quantize(&self, raster: &RgbImage) -> Result<RgbImage, EncodeError> {
        self.quantizer.quantize(raster, &self.palette)
    }

    /// Map every pixel to its hardware index.
    pub fn map(&self, raster: &RgbImage) -> IndexStream {
        self.mapper.map_raster(raster)
    }

    /// Pack a full panel frame, checking the pixel count first.
    pub fn pack(&self, stream: &IndexStream) -> Result<Vec<u8>, EncodeError> {
        pack_panel(stream, PANEL_PIXELS)
    }

    /// Run all stages.
    pub fn encode(&self, encoded: &[u8]) -> Result<EncodedImage, EncodeError> {
        let normalized = self.normalize(encoded)?;
        let quantized = self.quantize(&normalized)?;
        let stream = self.map(&quantized);
        let packed = self.pack(&stream)?;
        Ok(EncodedImage { stream, packed })
    }
}

impl Default for PanelEncoder {
    fn default() -> Self {
        Self::new(Palette::panel())
    }
}

/// Result of [`PanelEncoder::encode()`].
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// One index per panel pixel.
    pub stream: IndexStream,
    /// Packed transfer bytes.
    pub packed: Vec<u8>,
}

impl EncodedImage {
    /// Usage statistics for the encoded frame.
    pub fn stats(&self, palette: &Palette) -> ColorStatistics {
        ColorStatistics::from_stream(&self.stream, palette)
    }
}
