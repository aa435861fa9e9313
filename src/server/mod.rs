//! HTTP server layer.
//!
//! This module provides the HTTP API for serving vector tiles from single
//! sources and from the priority stack.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │      GET /tiles/{source}/{z}/{x}/{y}.mvt, /tiles-stack/...      │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │  explorer   │  │        routes           │  │
//! │  │ (requests)  │  │ (map context│  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod explorer;
pub mod handlers;
pub mod routes;

pub use explorer::{Compass, ExplorerQuery, SourceExplorer, SourceSummary, StackExplorer};
pub use handlers::{
    health_handler, parse_coordinate, parse_row, parse_tile_coord, source_explorer_handler,
    sources_handler, stack_explorer_handler, stack_tile_handler, stack_tile_tms_handler,
    tile_handler, tile_response, tile_tms_handler, AppState, ErrorResponse, HealthResponse,
    SourcesResponse, StackTilePathParams, TilePathParams, TILE_SOURCE_HEADER,
};
pub use routes::{create_router, RouterConfig};
