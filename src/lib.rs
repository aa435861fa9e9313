//! # tilestack
//!
//! A vector tile server for MBTiles tilesets.
//!
//! Tiles are served from individual tilesets, or from a priority-ordered
//! stack of tilesets where the first one holding a tile wins. A request
//! that no source can answer receives a canonical empty vector tile with a
//! 404 status, so map clients always get a valid tile.
//!
//! ## Features
//!
//! - **Row conventions**: XYZ and TMS addressing over the same stored tiles
//! - **Stacking**: ordered fallback across tilesets, short-circuit on first hit
//! - **Explorer context**: zoom bounds, centers and neighbour positions for map previews
//! - **Source caching**: open tilesets kept in an LRU with single-flight opens
//!
//! ## Architecture
//!
//! - [`coord`] - XYZ/TMS row flip and tile/lat-lon conversions
//! - [`source`] - Tile source traits, MBTiles store and registry
//! - [`tile`] - Single-source and stacked resolution, the empty tile
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use tilestack::{create_router, MbtilesCatalog, RouterConfig, SourceRegistry, TileService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = MbtilesCatalog::discover(&[PathBuf::from("tiles")], 4).await?;
//!     let registry = SourceRegistry::new(catalog).with_stack_order(vec!["world".to_string()]);
//!     let router = create_router(TileService::new(registry), RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod coord;
pub mod error;
pub mod server;
pub mod source;
pub mod tile;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, ServeConfig};
pub use coord::{lat_lon_to_tile, tile_to_lat_lon, xyz_to_tms, GeoPoint, RowScheme, TileCoord};
pub use error::{StorageError, TileError};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
pub use source::{
    MbtilesCatalog, MbtilesSource, SourceCatalog, SourceRegistry, TileSource, TilesetMetadata,
};
pub use tile::{
    empty_tile, resolve_single, SourceStack, StackSummary, TileRequest, TileResponse,
    TileService, EMPTY_TILE, MVT_CONTENT_TYPE,
};
