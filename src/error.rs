use thiserror::Error;

/// Errors raised by a tile backing store.
///
/// These are never folded into a tile miss: a store that cannot answer is
/// reported as a failure so that stack priority stays meaningful.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Error from the SQLite driver
    #[error("SQL error: {0}")]
    Sql(String),

    /// Filesystem error while discovering or opening a tileset
    #[error("I/O error: {0}")]
    Io(String),

    /// File exists but does not have the MBTiles schema
    #[error("Invalid tileset {path}: {reason}")]
    InvalidTileset { path: String, reason: String },
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Sql(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

/// Errors that can occur while resolving a tile request.
///
/// A tile that simply does not exist is not an error; see
/// [`TileResponse::found`](crate::tile::TileResponse::found).
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// The requested source is not among the known tile sources (HTTP 404)
    #[error("Unknown tile source: {source_name}")]
    UnknownSource { source_name: String },

    /// A path segment could not be parsed as a tile coordinate (HTTP 400)
    #[error("Invalid tile coordinate: {value}")]
    InvalidCoordinate { value: String },

    /// The backing store failed (HTTP 500)
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
