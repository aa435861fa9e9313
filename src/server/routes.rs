//! Router configuration for the tile server.
//!
//! This module defines the HTTP routes and applies middleware for CORS and
//! request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health                                   - Health check
//! /tiles/{source}/{z}/{x}/{y}.mvt           - Single source, XYZ rows
//! /tiles-tms/{source}/{z}/{x}/{y}.mvt       - Single source, TMS rows
//! /tiles-stack/{z}/{x}/{y}.mvt              - Stack, XYZ rows
//! /tiles-stack-tms/{z}/{x}/{y}.mvt          - Stack, TMS rows
//! /sources                                  - List sources
//! /sources/{source}                         - Source explorer context
//! /stack                                    - Stack explorer context
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tilestack::server::{create_router, RouterConfig};
//! use tilestack::source::{MbtilesCatalog, SourceRegistry};
//! use tilestack::tile::TileService;
//!
//! let catalog = MbtilesCatalog::discover(&paths, 4).await?;
//! let tile_service = TileService::new(SourceRegistry::new(catalog));
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(tile_service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, source_explorer_handler, sources_handler, stack_explorer_handler,
    stack_tile_handler, stack_tile_tms_handler, tile_handler, tile_tms_handler, AppState,
};
use crate::config::DEFAULT_CACHE_MAX_AGE;
use crate::source::SourceCatalog;
use crate::tile::TileService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Tile routes use a `{filename}` segment so both `{y}` and `{y}.mvt`
/// are accepted.
pub fn create_router<C>(tile_service: TileService<C>, config: RouterConfig) -> Router
where
    C: SourceCatalog + 'static,
{
    let app_state = AppState::with_cache_max_age(tile_service, config.cache_max_age);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/tiles/{source}/{z}/{x}/{filename}", get(tile_handler::<C>))
        .route(
            "/tiles-tms/{source}/{z}/{x}/{filename}",
            get(tile_tms_handler::<C>),
        )
        .route("/tiles-stack/{z}/{x}/{filename}", get(stack_tile_handler::<C>))
        .route(
            "/tiles-stack-tms/{z}/{x}/{filename}",
            get(stack_tile_tms_handler::<C>),
        )
        .route("/sources", get(sources_handler::<C>))
        .route("/sources/{source}", get(source_explorer_handler::<C>))
        .route("/stack", get(stack_explorer_handler::<C>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        // No origins allowed - this effectively disables CORS
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
