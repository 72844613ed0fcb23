//! Mapping quantized pixels to hardware color indices.

use std::collections::HashMap;

use image::RgbImage;

use crate::color::Rgb;
use crate::palette::{Palette, PanelColor};

/// Hardware color indices for every pixel, row-major (y outer, x inner).
///
/// Built once per run and only read afterwards: the packer, the header
/// renderer and the statistics all consume the same stream.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStream {
    indices: Vec<u8>,
    width: usize,
    height: usize,
}

impl IndexStream {
    /// Wrap raw indices.
    ///
    /// No length check happens here; the packer verifies
    /// `len() == width * height` before it writes anything.
    pub fn new(indices: Vec<u8>, width: usize, height: usize) -> Self {
        Self {
            indices,
            width,
            height,
        }
    }

    /// Raw indices, row-major.
    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Number of indices.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True if the stream holds no indices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Raster width the stream was produced from.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raster height the stream was produced from.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Render the stream back to nominal palette colors.
    ///
    /// Returns `None` when the stream length does not match its dimensions.
    pub fn to_rgb(&self) -> Option<RgbImage> {
        if self.indices.len() != self.width * self.height {
            return None;
        }
        let mut img = RgbImage::new(self.width as u32, self.height as u32);
        for (pixel, &idx) in img.pixels_mut().zip(&self.indices) {
            let color = PanelColor::from_index(idx).unwrap_or(PanelColor::White);
            *pixel = color.rgb().into();
        }
        Some(img)
    }
}

/// Maps quantized RGB pixels to hardware color indices.
///
/// Palette colors resolve through an exact lookup table. Anything else
/// (a quantizer that left off-palette pixels behind) falls back to the
/// nearest palette entry by squared Euclidean distance, first entry
/// winning ties.
///
/// # Example
///
/// ```
/// use panel_encode::{IndexMapper, Palette, Rgb};
///
/// let mapper = IndexMapper::new(&Palette::panel());
/// assert_eq!(mapper.map_pixel(Rgb::new(255, 0, 0)), 3);
/// assert_eq!(mapper.map_pixel(Rgb::new(10, 240, 20)), 6);
/// ```
#[derive(Debug, Clone)]
pub struct IndexMapper {
    exact: HashMap<Rgb, PanelColor>,
    palette: Palette,
}

impl IndexMapper {
    /// Build the lookup table for `palette`.
    pub fn new(palette: &Palette) -> Self {
        let exact = palette.colors().iter().map(|&c| (c.rgb(), c)).collect();
        Self {
            exact,
            palette: palette.clone(),
        }
    }

    /// Index for a single pixel. Never fails.
    pub fn map_pixel(&self, rgb: Rgb) -> u8 {
        if let Some(color) = self.exact.get(&rgb) {
            return color.index();
        }
        self.palette
            .nearest(rgb)
            .unwrap_or(PanelColor::White)
            .index()
    }

    /// Indices for a whole raster in row-major order.
    pub fn map_raster(&self, raster: &RgbImage) -> IndexStream {
        let indices = raster
            .pixels()
            .map(|&p| self.map_pixel(Rgb::from(p)))
            .collect();
        IndexStream::new(indices, raster.width() as usize, raster.height() as usize)
    }
}
