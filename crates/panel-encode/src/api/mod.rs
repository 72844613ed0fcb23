//! Public API for the panel-encode crate.
//!
//! This module provides the high-level [`PanelEncoder`], the pluggable
//! raster transform traits and the [`EncodeError`] unified error type.

mod encoder;
mod error;
mod transform;

pub use encoder::{EncodedImage, PanelEncoder};
pub use error::EncodeError;
pub use transform::{Normalize, Quantize};
