//! HTTP request handlers for the tile API.
//!
//! # Endpoints
//!
//! - `GET /tiles/{source}/{z}/{x}/{y}.mvt` - Tile from one source, XYZ rows
//! - `GET /tiles-tms/{source}/{z}/{x}/{y}.mvt` - Tile from one source, TMS rows
//! - `GET /tiles-stack/{z}/{x}/{y}.mvt` - Tile from the stack, XYZ rows
//! - `GET /tiles-stack-tms/{z}/{x}/{y}.mvt` - Tile from the stack, TMS rows
//! - `GET /sources` - List sources
//! - `GET /sources/{source}` - Explorer context for one source
//! - `GET /stack` - Explorer context for the stack
//! - `GET /health` - Health check endpoint

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::coord::{RowScheme, TileCoord};
use crate::error::{StorageError, TileError};
use crate::source::{SourceCatalog, TileSource};
use crate::tile::{TileRequest, TileResponse, TileService, MVT_CONTENT_TYPE};

use super::explorer::{ExplorerQuery, SourceExplorer, SourceSummary, StackExplorer};

/// Header naming the source that answered a tile request.
pub const TILE_SOURCE_HEADER: &str = "x-tile-source";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tile service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<C: SourceCatalog> {
    /// The tile service for processing tile requests
    pub tile_service: Arc<TileService<C>>,

    /// Cache-Control max-age for tile responses, in seconds
    pub cache_max_age: u32,
}

impl<C: SourceCatalog> AppState<C> {
    pub fn with_cache_max_age(tile_service: TileService<C>, cache_max_age: u32) -> Self {
        Self {
            tile_service: Arc::new(tile_service),
            cache_max_age,
        }
    }
}

impl<C: SourceCatalog> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            tile_service: Arc::clone(&self.tile_service),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for single-source tile requests.
///
/// Extracted from: `/tiles/{source}/{z}/{x}/{filename}`
/// where filename is `{y}` or `{y}.mvt`. Coordinates are kept as text so
/// that digit strings too large for their type become misses instead of
/// extractor rejections.
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    /// Source identifier
    pub source: String,

    /// Zoom level
    pub z: String,

    /// Tile column
    pub x: String,

    /// Tile row with optional .mvt extension (e.g., "0" or "0.mvt")
    pub filename: String,
}

/// Path parameters for stacked tile requests.
///
/// Extracted from: `/tiles-stack/{z}/{x}/{filename}`
#[derive(Debug, Deserialize)]
pub struct StackTilePathParams {
    pub z: String,
    pub x: String,
    pub filename: String,
}

/// Parse one coordinate segment.
///
/// Anything but ASCII digits is an [`TileError::InvalidCoordinate`]. A digit
/// string that does not fit `T` addresses no tile and yields `None`.
pub fn parse_coordinate<T: FromStr>(segment: &str) -> Result<Option<T>, TileError> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TileError::InvalidCoordinate {
            value: segment.to_string(),
        });
    }
    Ok(segment.parse().ok())
}

/// Parse the row from a `{y}` or `{y}.mvt` path segment.
pub fn parse_row(filename: &str) -> Result<Option<u32>, TileError> {
    let row = filename.strip_suffix(".mvt").unwrap_or(filename);
    parse_coordinate(row).map_err(|_| TileError::InvalidCoordinate {
        value: filename.to_string(),
    })
}

/// Parse a full tile address; `None` when any part overflows its type.
pub fn parse_tile_coord(
    z: &str,
    x: &str,
    filename: &str,
) -> Result<Option<TileCoord>, TileError> {
    let zoom = parse_coordinate::<u8>(z)?;
    let column = parse_coordinate::<u32>(x)?;
    let row = parse_row(filename)?;

    Ok(match (zoom, column, row) {
        (Some(zoom), Some(column), Some(row)) => Some(TileCoord::new(zoom, column, row)),
        _ => None,
    })
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_coordinate")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Response from the source list endpoint.
#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceSummary>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileError to HTTP response.
///
/// Errors are logged by severity: 5xx at ERROR, 404 at DEBUG (expected
/// while users browse), other 4xx at WARN.
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TileError::UnknownSource { .. } => (StatusCode::NOT_FOUND, "not_found"),
            TileError::InvalidCoordinate { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_coordinate")
            }
            TileError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

/// Wrapper for handler errors to implement IntoResponse.
pub struct HandlerError(pub TileError);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<TileError> for HandlerError {
    fn from(err: TileError) -> Self {
        HandlerError(err)
    }
}

impl From<StorageError> for HandlerError {
    fn from(err: StorageError) -> Self {
        HandlerError(TileError::Storage(err))
    }
}

// =============================================================================
// Response Shaping
// =============================================================================

/// Turn a resolved tile into an HTTP response.
///
/// Every tile response is a gzip-encoded vector tile. A hit is 200 with the
/// stored bytes untouched; a miss is 404 with the empty tile as body.
pub fn tile_response(tile: TileResponse, cache_max_age: u32) -> Response {
    let status = if tile.found {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };

    let mut response = (
        status,
        [
            (header::CONTENT_TYPE, MVT_CONTENT_TYPE.to_string()),
            (header::CONTENT_ENCODING, "gzip".to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", cache_max_age),
            ),
        ],
        tile.data,
    )
        .into_response();

    if let Some(value) = tile
        .source
        .as_deref()
        .and_then(|name| HeaderValue::from_str(name).ok())
    {
        response.headers_mut().insert(TILE_SOURCE_HEADER, value);
    }

    response
}

// =============================================================================
// Tile Handlers
// =============================================================================

async fn source_tile<C: SourceCatalog>(
    state: AppState<C>,
    params: TilePathParams,
    scheme: RowScheme,
) -> Result<Response, HandlerError> {
    let service = &state.tile_service;
    let tile = match parse_tile_coord(&params.z, &params.x, &params.filename)? {
        Some(coord) => {
            let request = TileRequest {
                source: params.source,
                coord,
                scheme,
            };
            service.get_tile(request).await?
        }
        None => service.get_off_grid_tile(&params.source).await?,
    };
    Ok(tile_response(tile, state.cache_max_age))
}

async fn stack_tile<C: SourceCatalog>(
    state: AppState<C>,
    params: StackTilePathParams,
    scheme: RowScheme,
) -> Result<Response, HandlerError> {
    let service = &state.tile_service;
    let tile = match parse_tile_coord(&params.z, &params.x, &params.filename)? {
        Some(coord) => service.get_stack_tile(coord, scheme).await?,
        None => service.get_off_grid_stack_tile().await?,
    };
    Ok(tile_response(tile, state.cache_max_age))
}

/// Handle single-source tile requests in the XYZ row convention.
///
/// # Endpoint
///
/// `GET /tiles/{source}/{z}/{x}/{y}.mvt`
///
/// # Response
///
/// - `200 OK`: stored tile bytes
/// - `404 Not Found`: the empty tile (miss, including coordinates too large
///   to address a tile), or a JSON error (unknown source)
/// - `400 Bad Request`: a coordinate segment that is not a digit string
/// - `500 Internal Server Error`: storage failure
///
/// # Headers
///
/// - `Content-Type: application/vnd.mapbox-vector-tile`
/// - `Content-Encoding: gzip`
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Tile-Source: {source}` (hits only)
pub async fn tile_handler<C: SourceCatalog>(
    State(state): State<AppState<C>>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, HandlerError> {
    source_tile(state, params, RowScheme::Xyz).await
}

/// Handle single-source tile requests in the TMS row convention.
///
/// `GET /tiles-tms/{source}/{z}/{x}/{y}.mvt`
pub async fn tile_tms_handler<C: SourceCatalog>(
    State(state): State<AppState<C>>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, HandlerError> {
    source_tile(state, params, RowScheme::Tms).await
}

/// Handle stacked tile requests in the XYZ row convention.
///
/// Sources are tried in priority order and the first stored tile wins.
///
/// `GET /tiles-stack/{z}/{x}/{y}.mvt`
pub async fn stack_tile_handler<C: SourceCatalog>(
    State(state): State<AppState<C>>,
    Path(params): Path<StackTilePathParams>,
) -> Result<Response, HandlerError> {
    stack_tile(state, params, RowScheme::Xyz).await
}

/// `GET /tiles-stack-tms/{z}/{x}/{y}.mvt`
pub async fn stack_tile_tms_handler<C: SourceCatalog>(
    State(state): State<AppState<C>>,
    Path(params): Path<StackTilePathParams>,
) -> Result<Response, HandlerError> {
    stack_tile(state, params, RowScheme::Tms).await
}

// =============================================================================
// Other Handlers
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List the known sources with their zoom bounds and tile URL template.
///
/// # Endpoint
///
/// `GET /sources`
///
/// # Response
///
/// ```json
/// {
///   "sources": [
///     {
///       "name": "world",
///       "min_zoom": 0,
///       "max_zoom": 6,
///       "attribution": "© OpenStreetMap contributors",
///       "tile_url": "/tiles/world/{z}/{x}/{y}.mvt"
///     }
///   ]
/// }
/// ```
pub async fn sources_handler<C: SourceCatalog>(
    State(state): State<AppState<C>>,
) -> Result<Json<SourcesResponse>, HandlerError> {
    let registry = state.tile_service.registry();
    let names = registry.source_names().await?;

    let mut sources = Vec::with_capacity(names.len());
    for name in &names {
        let source = registry.get_source(name).await?;
        let metadata = source.metadata().await?;
        sources.push(SourceSummary::from_metadata(name, &metadata));
    }

    Ok(Json(SourcesResponse { sources }))
}

/// Explorer context for one source.
///
/// # Endpoint
///
/// `GET /sources/{source}?lat=&lon=&z=`
///
/// # Errors
///
/// - `404 Not Found`: unknown source
/// - `400 Bad Request`: non-numeric query values
pub async fn source_explorer_handler<C: SourceCatalog>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
    Query(query): Query<ExplorerQuery>,
) -> Result<Json<SourceExplorer>, HandlerError> {
    let source = state.tile_service.registry().get_source(&name).await?;
    let metadata = source.metadata().await?;
    Ok(Json(SourceExplorer::build(source.name(), &metadata, &query)))
}

/// Explorer context for the stack.
///
/// `GET /stack`
pub async fn stack_explorer_handler<C: SourceCatalog>(
    State(state): State<AppState<C>>,
) -> Result<Json<StackExplorer>, HandlerError> {
    let stack = state.tile_service.stack().await?;
    let summary = stack.summary().await?;
    let names = stack.names().into_iter().map(str::to_string).collect();
    Ok(Json(StackExplorer::build(names, &summary)))
}

// =============================================================================
// Tests
// =============================================================================
