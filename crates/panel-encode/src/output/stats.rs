//! Per-color usage statistics.

use std::fmt;

use super::IndexStream;
use crate::palette::{Palette, PanelColor};

/// Usage of one palette color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorUsage {
    /// The color
    pub color: PanelColor,
    /// Number of pixels with this color
    pub count: usize,
    /// Share of all pixels in percent, rounded to 2 decimal places
    pub percentage: f64,
}

impl ColorUsage {
    /// Color name
    pub fn name(&self) -> &'static str {
        self.color.name()
    }

    /// Hardware index
    pub fn index(&self) -> u8 {
        self.color.index()
    }
}

/// Pixel counts per palette color, sorted by hardware index.
///
/// Every palette color is listed, including unused ones.
///
/// ```
/// use panel_encode::{ColorStatistics, IndexStream, Palette, PanelColor};
///
/// let stream = IndexStream::new(vec![3, 3, 3, 1], 4, 1);
/// let stats = ColorStatistics::from_stream(&stream, &Palette::panel());
///
/// let red = stats.get(PanelColor::Red).unwrap();
/// assert_eq!(red.count, 3);
/// assert_eq!(red.percentage, 75.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColorStatistics {
    total: usize,
    colors: Vec<ColorUsage>,
}

impl ColorStatistics {
    /// Count indices in `stream` for every color in `palette`.
    pub fn from_stream(stream: &IndexStream, palette: &Palette) -> Self {
        // Indices are 0..=6; 16 slots cover any nibble
        let mut counts = [0usize; 16];
        for &idx in stream.indices() {
            counts[(idx & 0x0F) as usize] += 1;
        }

        let total = stream.len();
        let mut colors: Vec<ColorUsage> = palette
            .colors()
            .iter()
            .map(|&color| {
                let count = counts[color.index() as usize];
                ColorUsage {
                    color,
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect();
        colors.sort_by_key(|u| u.color.index());

        Self { total, colors }
    }

    /// Total pixel count.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Usage per color, sorted by index.
    #[inline]
    pub fn colors(&self) -> &[ColorUsage] {
        &self.colors
    }

    /// Usage of a single color.
    pub fn get(&self, color: PanelColor) -> Option<&ColorUsage> {
        self.colors.iter().find(|u| u.color == color)
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 10_000.0 / total as f64).round() / 100.0
}

impl fmt::Display for ColorStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for usage in &self.colors {
            writeln!(
                f,
                "{:<7} (index {}): {:>7} pixels ({:.2}%)",
                usage.name(),
                usage.index(),
                usage.count,
                usage.percentage
            )?;
        }
        Ok(())
    }
}
