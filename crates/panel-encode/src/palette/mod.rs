//! The fixed panel palette and its hardware color indices.
//!
//! - [`PanelColor`]: one of the six colors the panel can show, carrying its
//!   RGB value, hardware index and firmware display nibble
//! - [`Palette`]: an ordered, validated set of panel colors used for
//!   nearest-color matching

mod error;
mod palette;

pub use error::PaletteError;
pub use palette::{Palette, PanelColor};
