//! Error diffusion quantization against the panel palette.
//!
//! The quantizer walks the raster in strict row-major, left-to-right order.
//! Output depends on that order, so it is never changed (no serpentine
//! scanning): the same input always yields bit-identical output.

mod floyd_steinberg;
mod kernel;

pub use floyd_steinberg::FloydSteinberg;
pub use kernel::{Kernel, FLOYD_STEINBERG};

use image::RgbImage;

use crate::api::EncodeError;
use crate::palette::Palette;

/// Sliding window of working pixel values.
///
/// Holds only the rows the kernel can reach (`max_dy + 1`). Row 0 is the
/// row being scanned. Rows are loaded from the source raster as the window
/// advances, and diffused error is added in place with every channel
/// clamped to [0, 255] after each addition.
#[derive(Debug)]
pub struct ScanlineBuffer {
    rows: Vec<Vec<[f32; 3]>>,
    width: usize,
}

impl ScanlineBuffer {
    /// Create a window over `image` starting at row 0.
    pub fn new(image: &RgbImage, row_depth: usize) -> Self {
        let width = image.width() as usize;
        let rows = (0..row_depth)
            .map(|dy| load_row(image, dy as u32))
            .collect();
        Self { rows, width }
    }

    /// Current working value of a pixel in the row being scanned.
    #[inline]
    pub fn get(&self, x: usize) -> [f32; 3] {
        self.rows[0][x]
    }

    /// Add error to a not-yet-visited pixel.
    ///
    /// Silently ignores out-of-bounds coordinates.
    #[inline]
    pub fn add_error(&mut self, x: usize, row_offset: usize, error: [f32; 3]) {
        if x < self.width && row_offset < self.rows.len() {
            let pixel = &mut self.rows[row_offset][x];
            for c in 0..3 {
                pixel[c] = (pixel[c] + error[c]).clamp(0.0, 255.0);
            }
        }
    }

    /// Advance so that `next_y` becomes the row being scanned.
    pub fn advance_row(&mut self, image: &RgbImage, next_y: usize) {
        self.rows.rotate_left(1);
        let incoming = next_y + self.rows.len() - 1;
        if let Some(last) = self.rows.last_mut() {
            *last = load_row(image, incoming as u32);
        }
    }
}

fn load_row(image: &RgbImage, y: u32) -> Vec<[f32; 3]> {
    if y >= image.height() {
        return vec![[0.0; 3]; image.width() as usize];
    }
    (0..image.width())
        .map(|x| {
            let [r, g, b] = image.get_pixel(x, y).0;
            [r as f32, g as f32, b as f32]
        })
        .collect()
}

/// Core error diffusion loop parameterized by kernel.
///
/// Returns a raster of the same size where every pixel is exactly one of
/// the palette's RGB values.
pub(crate) fn dither_with_kernel(
    image: &RgbImage,
    palette: &Palette,
    kernel: &Kernel,
) -> Result<RgbImage, EncodeError> {
    if palette.is_empty() {
        return Err(EncodeError::Quantize("palette is empty".to_string()));
    }

    let width = image.width() as usize;
    let height = image.height() as usize;
    let mut output = RgbImage::new(image.width(), image.height());
    let mut buffer = ScanlineBuffer::new(image, kernel.max_dy + 1);
    let divisor = kernel.divisor as f32;

    for y in 0..height {
        for x in 0..width {
            let pixel = buffer.get(x);
            let nearest = palette
                .nearest_f32(pixel)
                .ok_or_else(|| EncodeError::Quantize("palette is empty".to_string()))?;
            let rgb = nearest.rgb();
            output.put_pixel(x as u32, y as u32, rgb.into());

            let target = rgb.to_f32();
            let error = [
                pixel[0] - target[0],
                pixel[1] - target[1],
                pixel[2] - target[2],
            ];

            for &(dx, dy, weight) in kernel.entries {
                let nx = x as i32 + dx;
                if nx < 0 || nx as usize >= width || y + dy as usize >= height {
                    continue;
                }
                let share = weight as f32 / divisor;
                buffer.add_error(
                    nx as usize,
                    dy as usize,
                    [error[0] * share, error[1] * share, error[2] * share],
                );
            }
        }
        buffer.advance_row(image, y + 1);
    }

    Ok(output)
}
