//! Tile source abstraction layer.
//!
//! A tile source is one backing store of pre-rendered tiles, addressed by
//! `(zoom, column, row)` in the TMS row convention. This module provides the
//! traits the resolvers depend on and the MBTiles implementation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            SourceRegistry               │
//! │  (validates names, caches open handles, │
//! │   builds the priority stack)            │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          SourceCatalog Trait            │
//! │  (enumerates and opens tile sources)    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │   MbtilesCatalog  →  MbtilesSource      │
//! │   (SQLite files)     (point queries)    │
//! └─────────────────────────────────────────┘
//! ```

mod mbtiles;
mod metadata;
mod registry;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageError;

pub use mbtiles::{is_mbtiles_path, MbtilesCatalog, MbtilesSource, DEFAULT_MAX_CONNECTIONS};
pub use metadata::{TilesetCenter, TilesetMetadata, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
pub use registry::{SourceRegistry, DEFAULT_SOURCE_CACHE_CAPACITY};

/// Read access to one backing store of tiles.
///
/// Implementations must not translate rows: `row` is always TMS. Lookups
/// carry no shared cursor, so any number may run concurrently.
#[async_trait]
pub trait TileSource: Send + Sync {
    /// Identifier of this source (unique within its catalog).
    fn name(&self) -> &str;

    /// Fetch the stored tile bytes at `(zoom, column, row)`.
    ///
    /// Returns `Ok(None)` when no tile is stored at that address.
    async fn get_tile(&self, zoom: u8, column: u32, row: u32)
        -> Result<Option<Bytes>, StorageError>;

    /// Read the tileset's name/value metadata.
    async fn metadata(&self) -> Result<TilesetMetadata, StorageError>;
}

/// Enumerates the valid tile sources and opens them by name.
///
/// This is the narrow seam between resolution and source discovery: a
/// static list and a filesystem scan are interchangeable here.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// The type of source this catalog opens.
    type Source: TileSource + 'static;

    /// Names of the currently valid sources, in discovery order.
    async fn source_names(&self) -> Result<Vec<String>, StorageError>;

    /// Open the named source. Callers check membership first.
    async fn open_source(&self, name: &str) -> Result<Self::Source, StorageError>;
}
