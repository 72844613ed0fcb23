//! Decode an uploaded image and place it on a fixed-size black canvas.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};

use crate::api::{EncodeError, Normalize};
use crate::{PANEL_HEIGHT, PANEL_WIDTH};

/// Resampling filter used when scaling onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    /// Nearest neighbor
    Nearest,
    /// Linear (triangle) filter
    Triangle,
    /// Cubic Catmull-Rom
    CatmullRom,
    /// Gaussian
    Gaussian,
    /// Lanczos with window 3
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    /// Name as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            ResizeFilter::Nearest => "nearest",
            ResizeFilter::Triangle => "triangle",
            ResizeFilter::CatmullRom => "catmull-rom",
            ResizeFilter::Gaussian => "gaussian",
            ResizeFilter::Lanczos3 => "lanczos3",
        }
    }
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "triangle" | "linear" => Ok(ResizeFilter::Triangle),
            "catmull-rom" | "catmullrom" | "cubic" => Ok(ResizeFilter::CatmullRom),
            "gaussian" => Ok(ResizeFilter::Gaussian),
            "lanczos3" | "lanczos" => Ok(ResizeFilter::Lanczos3),
            other => Err(format!("unknown resize filter '{other}'")),
        }
    }
}

/// Scales an image to fit a fixed canvas and pads the rest with black.
///
/// Aspect ratio is preserved; images smaller than the canvas are scaled up.
/// The scaled image is centered, leaving black bars left/right or top/bottom.
///
/// # Example
///
/// ```
/// use panel_encode::{CanvasNormalizer, ResizeFilter};
/// use image::{DynamicImage, Rgb, RgbImage};
///
/// let normalizer = CanvasNormalizer::new(8, 4, ResizeFilter::Nearest);
/// let square = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([9, 9, 9])));
/// let canvas = normalizer.normalize_image(&square).unwrap();
///
/// assert_eq!(canvas.dimensions(), (8, 4));
/// assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0]);
/// assert_eq!(canvas.get_pixel(3, 2).0, [9, 9, 9]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasNormalizer {
    width: u32,
    height: u32,
    filter: ResizeFilter,
}

impl CanvasNormalizer {
    /// Create a normalizer for a `width`×`height` canvas.
    pub fn new(width: u32, height: u32, filter: ResizeFilter) -> Self {
        Self {
            width,
            height,
            filter,
        }
    }

    /// Normalizer for the panel canvas with the default filter.
    pub fn panel() -> Self {
        Self::new(PANEL_WIDTH, PANEL_HEIGHT, ResizeFilter::default())
    }

    /// Set the resampling filter.
    #[inline]
    pub fn filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Canvas dimensions.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Decode encoded image bytes, honoring EXIF orientation.
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage, EncodeError> {
        if bytes.is_empty() {
            return Err(EncodeError::Decode("input is empty".to_string()));
        }

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| EncodeError::Decode(e.to_string()))?;
        if reader.format().is_none() {
            return Err(EncodeError::Decode("unrecognized image format".to_string()));
        }

        let mut decoder = reader.into_decoder()?;
        let orientation = decoder.orientation()?;
        let mut img = DynamicImage::from_decoder(decoder)?;
        img.apply_orientation(orientation);
        Ok(img)
    }

    /// Size of a `src_width`×`src_height` image after uniform scaling to fit.
    pub fn fit(&self, src_width: u32, src_height: u32) -> Result<(u32, u32), EncodeError> {
        if src_width == 0 || src_height == 0 {
            return Err(EncodeError::Resize(format!(
                "source has zero dimension ({}x{})",
                src_width, src_height
            )));
        }

        let scale = (self.width as f64 / src_width as f64)
            .min(self.height as f64 / src_height as f64);
        let width = ((src_width as f64 * scale).round() as u32).clamp(1, self.width);
        let height = ((src_height as f64 * scale).round() as u32).clamp(1, self.height);
        Ok((width, height))
    }

    /// Scale a decoded image and center it on the black canvas.
    pub fn normalize_image(&self, img: &DynamicImage) -> Result<RgbImage, EncodeError> {
        let (width, height) = self.fit(img.width(), img.height())?;
        let rgb = img.to_rgb8();

        let scaled = if rgb.dimensions() == (width, height) {
            rgb
        } else {
            imageops::resize(&rgb, width, height, self.filter.into())
        };
        if scaled.dimensions() != (width, height) {
            return Err(EncodeError::Resize(format!(
                "resampler produced {}x{}, expected {}x{}",
                scaled.width(),
                scaled.height(),
                width,
                height
            )));
        }

        // RgbImage::new is zero-filled, i.e. black
        let mut canvas = RgbImage::new(self.width, self.height);
        let x = (self.width - width) / 2;
        let y = (self.height - height) / 2;
        imageops::replace(&mut canvas, &scaled, x as i64, y as i64);
        Ok(canvas)
    }
}

impl Default for CanvasNormalizer {
    fn default() -> Self {
        Self::panel()
    }
}

impl Normalize for CanvasNormalizer {
    fn normalize(&self, encoded: &[u8]) -> Result<RgbImage, EncodeError> {
        let img = Self::decode(encoded)?;
        self.normalize_image(&img)
    }
}
