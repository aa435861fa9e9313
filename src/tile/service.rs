//! Tile Service for resolving tile requests.
//!
//! The TileService is the main entry point for tile requests. It:
//! - Validates the source name against the registry
//! - Normalises the row to the TMS convention used by storage
//! - Queries one source, or every stack member in priority order
//! - Substitutes the empty tile on a miss
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         TileService                             │
//! │  ┌─────────────────────────┐   ┌─────────────────────────────┐  │
//! │  │       get_tile()        │   │      get_stack_tile()       │  │
//! │  │ 1. Look up source       │   │ 1. Check members (priority) │  │
//! │  │ 2. Flip row if XYZ      │   │ 2. Flip row if XYZ          │  │
//! │  │ 3. Query, or empty tile │   │ 3. Open in turn, first hit  │  │
//! │  └─────────────────────────┘   └─────────────────────────────┘  │
//! │                    │                         │                  │
//! │                    ▼                         ▼                  │
//! │             ┌─────────────────────────────────────┐             │
//! │             │           SourceRegistry            │             │
//! │             └─────────────────────────────────────┘             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::coord::{RowScheme, TileCoord};
use crate::error::{StorageError, TileError};
use crate::source::{SourceCatalog, SourceRegistry, TileSource};

use super::empty_tile;
use super::stack::SourceStack;

// =============================================================================
// Tile Request
// =============================================================================

/// A request for a tile from one named source.
#[derive(Debug, Clone)]
pub struct TileRequest {
    /// Source identifier
    pub source: String,

    /// Tile address, with the row in `scheme` convention
    pub coord: TileCoord,

    /// Row convention of `coord.y`
    pub scheme: RowScheme,
}

impl TileRequest {
    /// Create a request addressed in the XYZ convention.
    pub fn new(source: impl Into<String>, zoom: u8, x: u32, y: u32) -> Self {
        Self {
            source: source.into(),
            coord: TileCoord::new(zoom, x, y),
            scheme: RowScheme::Xyz,
        }
    }

    /// Create a request addressed in the TMS convention.
    pub fn tms(source: impl Into<String>, zoom: u8, x: u32, y: u32) -> Self {
        Self::new(source, zoom, x, y).with_scheme(RowScheme::Tms)
    }

    pub fn with_scheme(mut self, scheme: RowScheme) -> Self {
        self.scheme = scheme;
        self
    }
}

// =============================================================================
// Tile Response
// =============================================================================

/// Outcome of a tile resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileResponse {
    /// Stored tile bytes on a hit, the empty tile on a miss
    pub data: Bytes,

    /// Whether a source had the tile
    pub found: bool,

    /// Name of the source that answered (hits only)
    pub source: Option<String>,
}

impl TileResponse {
    pub fn hit(data: Bytes, source: impl Into<String>) -> Self {
        Self {
            data,
            found: true,
            source: Some(source.into()),
        }
    }

    /// A miss carrying the empty tile.
    pub fn miss() -> Self {
        Self {
            data: empty_tile(),
            found: false,
            source: None,
        }
    }
}

/// Resolve a tile against one source.
///
/// XYZ rows are flipped to TMS before the lookup; an absent tile yields the
/// empty tile with `found == false`. A row with no TMS address at this zoom
/// is a miss and storage is not queried.
pub async fn resolve_single<S: TileSource + ?Sized>(
    source: &S,
    coord: TileCoord,
    scheme: RowScheme,
) -> Result<TileResponse, StorageError> {
    let Some(row) = scheme.to_tms(coord.zoom, coord.y) else {
        debug!(?coord, scheme = scheme.name(), "Row has no TMS address");
        return Ok(TileResponse::miss());
    };

    match source.get_tile(coord.zoom, coord.x, row).await? {
        Some(data) => Ok(TileResponse::hit(data, source.name())),
        None => {
            debug!(?coord, source = source.name(), "Tile miss");
            Ok(TileResponse::miss())
        }
    }
}

// =============================================================================
// Tile Service
// =============================================================================

/// Service resolving single-source and stacked tile requests.
///
/// # Type Parameters
///
/// * `C` - The source catalog type (e.g. [`MbtilesCatalog`](crate::source::MbtilesCatalog))
///
/// # Example
///
/// ```ignore
/// use tilestack::tile::{TileService, TileRequest};
/// use tilestack::source::SourceRegistry;
///
/// let service = TileService::new(SourceRegistry::new(catalog));
///
/// let response = service.get_tile(TileRequest::new("world", 3, 4, 2)).await?;
/// println!("{} bytes, found: {}", response.data.len(), response.found);
/// ```
pub struct TileService<C: SourceCatalog> {
    registry: Arc<SourceRegistry<C>>,
}

impl<C: SourceCatalog> TileService<C> {
    pub fn new(registry: SourceRegistry<C>) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Resolve a tile from one named source.
    ///
    /// # Errors
    ///
    /// - [`TileError::UnknownSource`] when the source name is not valid
    /// - [`TileError::Storage`] when the lookup itself fails
    pub async fn get_tile(&self, request: TileRequest) -> Result<TileResponse, TileError> {
        let source = self.registry.get_source(&request.source).await?;
        Ok(resolve_single(source.as_ref(), request.coord, request.scheme).await?)
    }

    /// Resolve a tile against the priority-ordered stack.
    ///
    /// Every member name is checked before any lookup, so an unknown member
    /// fails the request even when a higher member holds the tile. Members
    /// are then opened and queried one at a time; the first stored tile is
    /// returned untouched and later members are neither opened nor queried.
    /// A storage failure aborts the resolution rather than being treated as
    /// a miss, since skipping it would let a lower-priority source win.
    pub async fn get_stack_tile(
        &self,
        coord: TileCoord,
        scheme: RowScheme,
    ) -> Result<TileResponse, TileError> {
        let names = self.registry.stack_names().await?;
        self.registry.ensure_known(&names).await?;

        let Some(row) = scheme.to_tms(coord.zoom, coord.y) else {
            debug!(?coord, scheme = scheme.name(), "Row has no TMS address");
            return Ok(TileResponse::miss());
        };

        for name in &names {
            let source = self.registry.open_known(name).await?;
            if let Some(data) = source.get_tile(coord.zoom, coord.x, row).await? {
                debug!(?coord, source = name.as_str(), "Stack hit");
                return Ok(TileResponse::hit(data, source.name()));
            }
        }

        debug!(?coord, members = names.len(), "Stack miss");
        Ok(TileResponse::miss())
    }

    /// Answer a single-source request whose coordinates address no tile.
    ///
    /// Used when a zoom, column or row does not fit its coordinate type. The
    /// source name is still validated; storage is not queried.
    pub async fn get_off_grid_tile(&self, source: &str) -> Result<TileResponse, TileError> {
        self.registry.ensure_known(&[source]).await?;
        debug!(source, "Coordinates address no tile");
        Ok(TileResponse::miss())
    }

    /// Stacked counterpart of [`get_off_grid_tile`](Self::get_off_grid_tile).
    pub async fn get_off_grid_stack_tile(&self) -> Result<TileResponse, TileError> {
        let names = self.registry.stack_names().await?;
        self.registry.ensure_known(&names).await?;
        debug!(members = names.len(), "Coordinates address no tile");
        Ok(TileResponse::miss())
    }

    /// The current stack with every member opened, in priority order.
    pub async fn stack(&self) -> Result<SourceStack<C::Source>, TileError> {
        self.registry.stack().await
    }

    /// Get a reference to the underlying registry.
    pub fn registry(&self) -> &Arc<SourceRegistry<C>> {
        &self.registry
    }
}

// =============================================================================
// Tests
// =============================================================================
