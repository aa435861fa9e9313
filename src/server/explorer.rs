//! Explorer context for browsing tile sources.
//!
//! These are the values a map preview needs: where to start, which zooms
//! are allowed, the tile under the current position and its neighbours.
//! Everything here is computed from tileset metadata; nothing queries tiles.

use serde::{Deserialize, Serialize};

use crate::coord::{lat_lon_to_tile, tile_to_lat_lon, GeoPoint};
use crate::source::TilesetMetadata;
use crate::tile::StackSummary;

/// URL template for XYZ tiles of a single source.
pub fn source_tile_url(name: &str) -> String {
    format!("/tiles/{}/{{z}}/{{x}}/{{y}}.mvt", urlencoding::encode(name))
}

/// URL template for XYZ tiles of the stack.
pub const STACK_TILE_URL: &str = "/tiles-stack/{z}/{x}/{y}.mvt";

// =============================================================================
// Source List
// =============================================================================

/// One entry of the source listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub attribution: Option<String>,
    pub tile_url: String,
}

impl SourceSummary {
    pub fn from_metadata(name: &str, metadata: &TilesetMetadata) -> Self {
        let (min_zoom, max_zoom) = metadata.zoom_range();
        Self {
            name: name.to_string(),
            min_zoom,
            max_zoom,
            attribution: metadata.attribution().map(str::to_string),
            tile_url: source_tile_url(name),
        }
    }
}

// =============================================================================
// Single-Source Explorer
// =============================================================================

/// Query parameters of the explorer endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ExplorerQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub z: Option<i64>,
}

/// Positions one tile away from the current tile in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Compass {
    pub n: GeoPoint,
    pub s: GeoPoint,
    pub e: GeoPoint,
    pub w: GeoPoint,
}

impl Compass {
    /// Neighbour corners of the XYZ tile `(x, y)`.
    ///
    /// At the grid edge a neighbour lies beyond the grid; its position is
    /// still computed so clients can decide what to do with it.
    pub fn around(x: u32, y: u32, zoom: u8) -> Self {
        let (x, y) = (i64::from(x), i64::from(y));
        Self {
            n: tile_to_lat_lon(x, y - 1, zoom),
            s: tile_to_lat_lon(x, y + 1, zoom),
            e: tile_to_lat_lon(x + 1, y, zoom),
            w: tile_to_lat_lon(x - 1, y, zoom),
        }
    }
}

/// Explorer context for one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceExplorer {
    pub source: String,
    pub tile_url: String,
    pub metadata: TilesetMetadata,
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub default_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub attribution: Option<String>,
    pub current_latitude: f64,
    pub current_longitude: f64,
    pub current_zoom: u8,
    pub current_x: u32,
    pub current_y: u32,
    pub can_zoom_in: bool,
    pub can_zoom_out: bool,
    pub compass: Compass,
}

impl SourceExplorer {
    /// Build the context from metadata and the requested view.
    ///
    /// Missing query values fall back to the tileset's `center`, or 0,0,0.
    /// The zoom is clamped into the declared range; when the range is
    /// inverted the minimum wins.
    pub fn build(name: &str, metadata: &TilesetMetadata, query: &ExplorerQuery) -> Self {
        let (default_latitude, default_longitude, default_zoom) = match metadata.center() {
            Some(center) => (center.point.latitude, center.point.longitude, center.zoom),
            None => (0.0, 0.0, 0),
        };
        let (min_zoom, max_zoom) = metadata.zoom_range();

        let latitude = query.lat.unwrap_or(default_latitude);
        let longitude = query.lon.unwrap_or(default_longitude);
        let zoom = clamp_zoom(query.z.unwrap_or(i64::from(default_zoom)), min_zoom, max_zoom);

        let (x, y) = lat_lon_to_tile(latitude, longitude, zoom);

        Self {
            source: name.to_string(),
            tile_url: source_tile_url(name),
            metadata: metadata.clone(),
            default_latitude,
            default_longitude,
            default_zoom,
            min_zoom,
            max_zoom,
            attribution: metadata.attribution().map(str::to_string),
            current_latitude: latitude,
            current_longitude: longitude,
            current_zoom: zoom,
            current_x: x,
            current_y: y,
            can_zoom_in: zoom < max_zoom,
            can_zoom_out: zoom > min_zoom,
            compass: Compass::around(x, y, zoom),
        }
    }
}

fn clamp_zoom(requested: i64, min_zoom: u8, max_zoom: u8) -> u8 {
    let mut zoom = requested;
    if zoom > i64::from(max_zoom) {
        zoom = i64::from(max_zoom);
    }
    if zoom < i64::from(min_zoom) {
        zoom = i64::from(min_zoom);
    }
    // In range of u8 after the two bounds above
    zoom as u8
}

// =============================================================================
// Stack Explorer
// =============================================================================

/// Explorer context for the source stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackExplorer {
    /// Member names, highest priority first
    pub sources: Vec<String>,
    pub tile_url: String,
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub default_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub attribution: String,
}

impl StackExplorer {
    pub fn build(sources: Vec<String>, summary: &StackSummary) -> Self {
        Self {
            sources,
            tile_url: STACK_TILE_URL.to_string(),
            default_latitude: 0.0,
            default_longitude: 0.0,
            default_zoom: summary.min_zoom,
            min_zoom: summary.min_zoom,
            max_zoom: summary.max_zoom,
            attribution: summary.attribution.clone(),
        }
    }
}
