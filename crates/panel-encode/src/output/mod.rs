//! Output types for the encoding pipeline.
//!
//! [`IndexStream`] is the canonical result: one hardware color index per
//! panel pixel in row-major order. Everything written to disk is derived
//! from it without modifying it:
//!
//! - **Packed binary** ([`pack_panel`]): two indices per byte, transfer format
//! - **Source array** ([`render_header`]): C initializer for firmware bundling
//! - **Statistics** ([`ColorStatistics`]): per-color pixel counts

mod header;
mod index_stream;
mod pack;
mod stats;

pub use header::{render_header, VALUES_PER_LINE};
pub use index_stream::{IndexMapper, IndexStream};
pub use pack::{pack_nibbles, pack_panel, unpack_nibbles};
pub use stats::{ColorStatistics, ColorUsage};
