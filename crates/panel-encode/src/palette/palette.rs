//! Panel colors and the palette used for nearest-color matching.

use std::collections::HashSet;

use super::error::PaletteError;
use crate::color::Rgb;

/// One of the six colors the panel can display.
///
/// The discriminant is the panel's hardware color index. Index 4 does not
/// exist on this panel; the firmware's nibble table depends on the sparse
/// set {0, 1, 2, 3, 5, 6}, so it must not be compacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PanelColor {
    /// Index 0
    Black = 0,
    /// Index 1
    White = 1,
    /// Index 2
    Yellow = 2,
    /// Index 3
    Red = 3,
    /// Index 5
    Blue = 5,
    /// Index 6
    Green = 6,
}

impl PanelColor {
    /// All panel colors in enumeration order.
    ///
    /// This order is also the tie-break order for nearest-color matching:
    /// when two entries are equally close, the earlier one wins.
    pub const ALL: [PanelColor; 6] = [
        PanelColor::White,
        PanelColor::Black,
        PanelColor::Red,
        PanelColor::Yellow,
        PanelColor::Green,
        PanelColor::Blue,
    ];

    /// Hardware color index.
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Look up a color by hardware index. Returns `None` for 4 and for
    /// anything above 6.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(PanelColor::Black),
            1 => Some(PanelColor::White),
            2 => Some(PanelColor::Yellow),
            3 => Some(PanelColor::Red),
            5 => Some(PanelColor::Blue),
            6 => Some(PanelColor::Green),
            _ => None,
        }
    }

    /// Nominal RGB value.
    pub const fn rgb(self) -> Rgb {
        match self {
            PanelColor::Black => Rgb::new(0, 0, 0),
            PanelColor::White => Rgb::new(255, 255, 255),
            PanelColor::Yellow => Rgb::new(255, 255, 0),
            PanelColor::Red => Rgb::new(255, 0, 0),
            PanelColor::Blue => Rgb::new(0, 0, 255),
            PanelColor::Green => Rgb::new(0, 255, 0),
        }
    }

    /// Byte the firmware's bundled image table uses for this color.
    ///
    /// Only used by the source-array export; the transfer binary carries
    /// raw indices.
    pub const fn display_nibble(self) -> u8 {
        match self {
            PanelColor::Black => 0x00,
            PanelColor::White => 0xFF,
            PanelColor::Yellow => 0xFC,
            PanelColor::Red => 0xE0,
            PanelColor::Blue => 0x03,
            PanelColor::Green => 0x1C,
        }
    }

    /// Human-readable name, as used in statistics.
    pub const fn name(self) -> &'static str {
        match self {
            PanelColor::Black => "Black",
            PanelColor::White => "White",
            PanelColor::Yellow => "Yellow",
            PanelColor::Red => "Red",
            PanelColor::Blue => "Blue",
            PanelColor::Green => "Green",
        }
    }
}

/// An ordered set of panel colors.
///
/// The palette is immutable once built and is handed to every pipeline
/// component that needs it. [`Palette::panel()`] returns the full six-color
/// palette in enumeration order.
///
/// # Example
///
/// ```
/// use panel_encode::{Palette, PanelColor, Rgb};
///
/// let palette = Palette::panel();
/// assert_eq!(palette.len(), 6);
/// assert_eq!(palette.nearest(Rgb::new(250, 10, 10)), Some(PanelColor::Red));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<PanelColor>,
}

impl Palette {
    /// Create a palette from panel colors, preserving their order.
    ///
    /// # Errors
    ///
    /// - [`PaletteError::EmptyPalette`] if `colors` is empty
    /// - [`PaletteError::DuplicateColor`] if a color appears twice
    pub fn new(colors: &[PanelColor]) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::EmptyPalette);
        }

        let mut seen = HashSet::new();
        for (i, color) in colors.iter().enumerate() {
            if !seen.insert(*color) {
                return Err(PaletteError::DuplicateColor { index: i });
            }
        }

        Ok(Self {
            colors: colors.to_vec(),
        })
    }

    /// The panel's six colors in enumeration order.
    pub fn panel() -> Self {
        Self {
            colors: PanelColor::ALL.to_vec(),
        }
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self { colors: Vec::new() }
    }

    /// Returns the number of colors in the palette.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Returns true if the palette is empty.
    ///
    /// Always `false` for palettes built through [`Palette::new()`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colors in enumeration order.
    #[inline]
    pub fn colors(&self) -> &[PanelColor] {
        &self.colors
    }

    /// Find the color whose RGB value equals `rgb` exactly.
    pub fn exact(&self, rgb: Rgb) -> Option<PanelColor> {
        self.colors.iter().copied().find(|c| c.rgb() == rgb)
    }

    /// Nearest color by squared Euclidean RGB distance.
    ///
    /// Ties go to the color that comes first in the palette. Returns `None`
    /// only for an empty palette.
    pub fn nearest(&self, rgb: Rgb) -> Option<PanelColor> {
        let mut best: Option<(PanelColor, u32)> = None;
        for &color in &self.colors {
            let dist = color.rgb().distance_sq(rgb);
            // Strict less-than keeps the first of equal candidates
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((color, dist));
            }
        }
        best.map(|(color, _)| color)
    }

    /// Nearest color for an unquantized working value (used while dithering).
    pub fn nearest_f32(&self, value: [f32; 3]) -> Option<PanelColor> {
        let mut best: Option<(PanelColor, f32)> = None;
        for &color in &self.colors {
            let dist = color.rgb().distance_sq_f32(value);
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((color, dist));
            }
        }
        best.map(|(color, _)| color)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::panel()
    }
}
