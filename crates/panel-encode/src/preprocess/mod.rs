//! Canvas normalization: decode, fit and letterbox onto the panel canvas.

mod canvas;

pub use canvas::{CanvasNormalizer, ResizeFilter};
