//! Unified error type for the panel-encode public API.
//!
//! [`EncodeError`] covers every way a stage of the encoding pipeline can
//! fail, so application code can propagate with `?`.

use crate::palette::PaletteError;
use std::fmt;

/// Error returned by the encoding stages.
///
/// # Example
///
/// ```
/// use panel_encode::{CanvasNormalizer, EncodeError, Normalize};
///
/// let normalizer = CanvasNormalizer::panel();
/// let err = normalizer.normalize(b"not an image").unwrap_err();
/// assert!(matches!(err, EncodeError::Decode(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// Input bytes are not a decodable image
    Decode(String),
    /// Scaling onto the canvas failed
    Resize(String),
    /// Palette quantization failed
    Quantize(String),
    /// The index stream does not hold exactly one index per panel pixel
    SizeMismatch {
        /// Pixel count of the panel
        expected: usize,
        /// Length of the stream handed to the packer
        actual: usize,
    },
    /// Palette validation error
    Palette(PaletteError),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Decode(msg) => write!(f, "decode error: {}", msg),
            EncodeError::Resize(msg) => write!(f, "resize error: {}", msg),
            EncodeError::Quantize(msg) => write!(f, "quantize error: {}", msg),
            EncodeError::SizeMismatch { expected, actual } => write!(
                f,
                "size mismatch: expected {} indices, got {}",
                expected, actual
            ),
            EncodeError::Palette(err) => write!(f, "palette error: {}", err),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Palette(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PaletteError> for EncodeError {
    fn from(err: PaletteError) -> Self {
        EncodeError::Palette(err)
    }
}

impl From<image::ImageError> for EncodeError {
    fn from(err: image::ImageError) -> Self {
        EncodeError::Decode(err.to_string())
    }
}
