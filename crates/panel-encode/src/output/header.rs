//! C source-array export for bundling an image into firmware.

use std::fmt::Write;

use super::IndexStream;
use crate::palette::PanelColor;

/// Values per source line in [`render_header`] output.
pub const VALUES_PER_LINE: usize = 16;

/// Render the stream as a C initializer list.
///
/// Each value is the firmware display byte of one pixel's color, not the
/// raw index. Indices outside the panel set render as white.
///
/// ```
/// use panel_encode::{render_header, IndexStream};
///
/// let stream = IndexStream::new(vec![1, 0, 3], 3, 1);
/// assert_eq!(
///     render_header(&stream),
///     "const unsigned char image[] = {\n  0xFF, 0x00, 0xE0\n};\n"
/// );
/// ```
pub fn render_header(stream: &IndexStream) -> String {
    // "0xNN, " is 6 bytes per value
    let mut out = String::with_capacity(stream.len() * 6 + 64);
    out.push_str("const unsigned char image[] = {\n");

    let lines = stream.indices().chunks(VALUES_PER_LINE);
    let last = lines.len().saturating_sub(1);
    for (n, line) in lines.enumerate() {
        out.push_str("  ");
        for (i, &idx) in line.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let nibble = PanelColor::from_index(idx)
                .unwrap_or(PanelColor::White)
                .display_nibble();
            // Writing into a String cannot fail
            let _ = write!(out, "0x{:02X}", nibble);
        }
        if n != last {
            out.push(',');
        }
        out.push('\n');
    }

    out.push_str("};\n");
    out
}
