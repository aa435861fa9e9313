//! Tile resolution layer.
//!
//! This module turns a tile request into stored tile bytes or the canonical
//! empty tile.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │resolve_single│  │ get_stack_tile  │  │
//! │  │ (one source) │  │ (first hit wins)│  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            SourceRegistry               │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileService`]: entry point for single-source and stacked requests
//! - [`SourceStack`]: opened stack members with their zoom envelope and attribution
//! - [`resolve_single`]: row normalisation plus one lookup
//! - [`EMPTY_TILE`]: gzip-compressed empty vector tile served on every miss

mod service;
mod stack;

use bytes::Bytes;

pub use service::{resolve_single, TileRequest, TileResponse, TileService};
pub use stack::{StackSummary, SourceStack};

/// MIME type of Mapbox Vector Tiles.
pub const MVT_CONTENT_TYPE: &str = "application/vnd.mapbox-vector-tile";

/// A gzip-compressed vector tile with no features.
///
/// Served with a 404 status whenever no source has the requested tile, so
/// map clients always receive a structurally valid tile.
pub static EMPTY_TILE: &[u8] = &[
    0x1F, 0x8B, 0x08, 0x00, 0xFA, 0x78, 0x18, 0x5E, 0x00, 0x03, 0x93, 0xE2, 0xE3, 0x62, 0x8F,
    0x8F, 0x4F, 0xCD, 0x2D, 0x28, 0xA9, 0xD4, 0x68, 0x50, 0xA8, 0x60, 0x02, 0x00, 0x64, 0x71,
    0x44, 0x36, 0x10, 0x00, 0x00, 0x00,
];

/// The empty tile as shared bytes (no copy).
pub fn empty_tile() -> Bytes {
    Bytes::from_static(EMPTY_TILE)
}
