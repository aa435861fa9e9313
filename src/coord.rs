//! Tile coordinate conversions.
//!
//! Provides the XYZ <-> TMS row flip and conversions between tile indices
//! and geographic coordinates in the Web Mercator slippy-map scheme.
//!
//! # Row conventions
//!
//! ```text
//!   XYZ (row 0 at the north edge)     TMS (row 0 at the south edge)
//!   ┌─────┬─────┐ y=0                 ┌─────┬─────┐ y=1
//!   ├─────┼─────┤ y=1                 ├─────┼─────┤ y=0
//!   └─────┴─────┘                     └─────┴─────┘
//! ```
//!
//! The flip `y' = 2^zoom - 1 - y` is its own inverse, so a single function
//! serves both directions.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Northernmost latitude representable in Web Mercator (degrees).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Southernmost latitude representable in Web Mercator (degrees).
pub const MIN_LATITUDE: f64 = -MAX_LATITUDE;

/// Row numbering convention of a tile request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowScheme {
    /// Row 0 at the top of the grid ("Google" scheme)
    Xyz,
    /// Row 0 at the bottom of the grid, as stored in MBTiles
    Tms,
}

impl RowScheme {
    /// Convert a row in this scheme to the TMS row used by storage.
    ///
    /// Returns `None` when the row has no TMS address at this zoom.
    pub fn to_tms(self, zoom: u8, y: u32) -> Option<u32> {
        match self {
            RowScheme::Xyz => xyz_to_tms(zoom, y),
            RowScheme::Tms => Some(y),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RowScheme::Xyz => "xyz",
            RowScheme::Tms => "tms",
        }
    }
}

/// A tile address. The row convention is carried by the request, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub zoom: u8,

    /// Column, 0-indexed from the west edge
    pub x: u32,

    /// Row, in whichever convention the request uses
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }
}

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Number of tiles along one axis at `zoom`, if it fits in a `u64`.
pub fn grid_size(zoom: u8) -> Option<u64> {
    1u64.checked_shl(u32::from(zoom))
}

/// Flip a row between the XYZ and TMS conventions.
///
/// Computes `2^zoom - 1 - y`. Applying it twice returns the original row.
/// Returns `None` when `y >= 2^zoom` or the grid does not fit a `u32` row.
pub fn xyz_to_tms(zoom: u8, y: u32) -> Option<u32> {
    let max_row = grid_size(zoom)?.checked_sub(1)?;
    let max_row = u32::try_from(max_row).ok()?;
    max_row.checked_sub(y)
}

/// Latitude/longitude of the north-west corner of a tile.
///
/// Indices slightly outside the grid are accepted (neighbour tiles one step
/// beyond an edge); the result may then lie beyond the Mercator band.
pub fn tile_to_lat_lon(x: i64, y: i64, zoom: u8) -> GeoPoint {
    let n = 2.0_f64.powi(i32::from(zoom));

    let longitude = x as f64 / n * 360.0 - 180.0;

    let lat_rad = (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan();
    let latitude = lat_rad * 180.0 / PI;

    GeoPoint {
        latitude,
        longitude,
    }
}

/// Tile containing a latitude/longitude, clamped onto the grid.
///
/// Any input, including latitudes beyond the poles or longitudes past the
/// antimeridian, resolves to a tile in `[0, 2^zoom - 1]` on both axes.
pub fn lat_lon_to_tile(latitude: f64, longitude: f64, zoom: u8) -> (u32, u32) {
    let n = 2.0_f64.powi(i32::from(zoom));

    let x = (longitude + 180.0) / 360.0 * n;

    // Outside the band tan() wraps around and the row lands on the wrong pole
    let lat_rad = latitude.clamp(MIN_LATITUDE, MAX_LATITUDE).to_radians();
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;

    (clamp_index(x, n), clamp_index(y, n))
}

fn clamp_index(value: f64, n: f64) -> u32 {
    let max = (n - 1.0).max(0.0);
    // NaN falls through both comparisons and casts to 0
    let clamped = value.floor().clamp(0.0, max);
    clamped as u32
}
