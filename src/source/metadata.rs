//! Tileset metadata as stored in the MBTiles `metadata` table.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::coord::GeoPoint;

/// Default minimum zoom when a tileset does not declare one.
pub const DEFAULT_MIN_ZOOM: u8 = 0;

/// Default maximum zoom when a tileset does not declare one.
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// Map center declared by a tileset (`center` = `"lon,lat,zoom"`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TilesetCenter {
    pub point: GeoPoint,
    pub zoom: u8,
}

/// Name/value metadata of one tileset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TilesetMetadata {
    values: BTreeMap<String, String>,
}

impl TilesetMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` rows; later rows override earlier ones.
    pub fn from_rows<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: rows
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Declared minimum zoom, if present and parsable.
    pub fn min_zoom(&self) -> Option<u8> {
        self.parse_zoom("minzoom")
    }

    /// Declared maximum zoom, if present and parsable.
    pub fn max_zoom(&self) -> Option<u8> {
        self.parse_zoom("maxzoom")
    }

    /// Zoom bounds with the defaults applied.
    pub fn zoom_range(&self) -> (u8, u8) {
        (
            self.min_zoom().unwrap_or(DEFAULT_MIN_ZOOM),
            self.max_zoom().unwrap_or(DEFAULT_MAX_ZOOM),
        )
    }

    /// Attribution text; an empty value counts as absent.
    pub fn attribution(&self) -> Option<&str> {
        self.get("attribution").filter(|a| !a.is_empty())
    }

    /// Declared center, when it has exactly three numeric parts.
    pub fn center(&self) -> Option<TilesetCenter> {
        let raw = self.get("center")?;
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return None;
        }

        let parsed = (
            parts[0].parse::<f64>(),
            parts[1].parse::<f64>(),
            parts[2].parse::<f64>(),
        );
        match parsed {
            (Ok(longitude), Ok(latitude), Ok(zoom)) if zoom >= 0.0 => Some(TilesetCenter {
                point: GeoPoint {
                    latitude,
                    longitude,
                },
                zoom: zoom.min(f64::from(u8::MAX)) as u8,
            }),
            _ => {
                warn!(center = raw, "Unable to parse metadata center value");
                None
            }
        }
    }

    fn parse_zoom(&self, name: &str) -> Option<u8> {
        let raw = self.get(name)?;
        match raw.trim().parse::<u8>() {
            Ok(zoom) => Some(zoom),
            Err(e) => {
                warn!(name, value = raw, "Unable to parse metadata zoom value: {}", e);
                None
            }
        }
    }
}
