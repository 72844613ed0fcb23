//! panel-encode: photo encoding for 800×480 six-color e-paper panels
//!
//! This library turns an arbitrary uploaded image into the exact byte
//! stream the panel controller expects, plus the side artifacts derived
//! from the same pixels.
//!
//! # Quick Start
//!
//! ```
//! use panel_encode::{PanelEncoder, Palette};
//!
//! let encoder = PanelEncoder::new(Palette::panel());
//! assert!(encoder.encode(b"not an image").is_err());
//! ```
//!
//! # Pipeline
//!
//! ```text
//! encoded bytes
//!     |  CanvasNormalizer   decode, fit 800x480, pad black
//!     v
//! RgbImage (800x480)
//!     |  FloydSteinberg     error diffusion against the 6-color palette
//!     v
//! RgbImage (palette colors only)
//!     |  IndexMapper        RGB -> hardware index {0,1,2,3,5,6}
//!     v
//! IndexStream (384000 indices, row-major)
//!     |-- pack_panel        two indices per byte, 192000 bytes
//!     |-- render_header     C initializer of display bytes
//!     '-- ColorStatistics   counts and percentages
//! ```
//!
//! # Hardware Indices
//!
//! | Color  | Index | Display byte |
//! |--------|-------|--------------|
//! | Black  | 0     | 0x00         |
//! | White  | 1     | 0xFF         |
//! | Yellow | 2     | 0xFC         |
//! | Red    | 3     | 0xE0         |
//! | Blue   | 5     | 0x03         |
//! | Green  | 6     | 0x1C         |
//!
//! Index 4 is unused by the panel. The packed binary carries the raw
//! indices; the display bytes only appear in the C source export.

pub mod api;
pub mod color;
pub mod dither;
pub mod output;
pub mod palette;
pub mod preprocess;


pub use api::{EncodeError, EncodedImage, Normalize, PanelEncoder, Quantize};
pub use color::Rgb;
pub use dither::FloydSteinberg;
pub use output::{
    pack_nibbles, pack_panel, render_header, unpack_nibbles, ColorStatistics, ColorUsage,
    IndexMapper, IndexStream,
};
pub use palette::{Palette, PaletteError, PanelColor};
pub use preprocess::{CanvasNormalizer, ResizeFilter};

/// Panel width in pixels.
pub const PANEL_WIDTH: u32 = 800;

/// Panel height in pixels.
pub const PANEL_HEIGHT: u32 = 480;

/// Pixels per frame.
pub const PANEL_PIXELS: usize = (PANEL_WIDTH * PANEL_HEIGHT) as usize;

/// Bytes per packed frame (two pixels per byte).
pub const PACKED_LEN: usize = PANEL_PIXELS.div_ceil(2);
