//! MBTiles-backed tile sources.
//!
//! An MBTiles file is an SQLite database with a `tiles` table keyed by
//! `(zoom_level, tile_column, tile_row)` in TMS row order and a `metadata`
//! table of name/value pairs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info, warn};

use crate::error::StorageError;

use super::metadata::TilesetMetadata;
use super::{SourceCatalog, TileSource};

/// Default number of pooled SQLite connections per tileset.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// File extension of tileset files picked up from scanned directories.
const MBTILES_EXTENSION: &str = "mbtiles";

const SELECT_TILE_SQL: &str = "SELECT tile_data FROM tiles \
     WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3";

const SELECT_METADATA_SQL: &str = "SELECT name, value FROM metadata";

const SELECT_SCHEMA_SQL: &str = "SELECT name FROM sqlite_master \
     WHERE type IN ('table', 'view') AND name IN ('tiles', 'metadata')";

/// Check whether a path has the `.mbtiles` extension (case-insensitive).
pub fn is_mbtiles_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(MBTILES_EXTENSION))
        .unwrap_or(false)
}

// =============================================================================
// MbtilesSource
// =============================================================================

/// A single MBTiles file opened read-only.
#[derive(Clone, Debug)]
pub struct MbtilesSource {
    name: String,
    path: PathBuf,
    pool: SqlitePool,
}

impl MbtilesSource {
    /// Open an MBTiles file read-only.
    pub async fn open(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        max_connections: u32,
    ) -> Result<Self, StorageError> {
        let path = path.into();
        let pool = open_pool(&path, max_connections).await?;
        Ok(Self {
            name: name.into(),
            path,
            pool,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TileSource for MbtilesSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_tile(
        &self,
        zoom: u8,
        column: u32,
        row: u32,
    ) -> Result<Option<Bytes>, StorageError> {
        // A row whose tile_data is NULL holds no tile
        let data = sqlx::query_scalar::<_, Option<Vec<u8>>>(SELECT_TILE_SQL)
            .bind(i64::from(zoom))
            .bind(i64::from(column))
            .bind(i64::from(row))
            .fetch_optional(&self.pool)
            .await?
            .flatten();

        Ok(data.map(Bytes::from))
    }

    async fn metadata(&self) -> Result<TilesetMetadata, StorageError> {
        let rows = sqlx::query_as::<_, (Option<String>, Option<String>)>(SELECT_METADATA_SQL)
            .fetch_all(&self.pool)
            .await?;

        Ok(TilesetMetadata::from_rows(
            rows.into_iter()
                .filter_map(|(name, value)| Some((name?, value.unwrap_or_default()))),
        ))
    }
}

async fn open_pool(path: &Path, max_connections: u32) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .create_if_missing(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

// =============================================================================
// MbtilesCatalog
// =============================================================================

/// Catalog of MBTiles files discovered from a list of files and directories.
///
/// Discovery runs once; the catalog's name list is fixed afterwards, which
/// keeps enumeration idempotent for the lifetime of the server.
#[derive(Debug, Clone)]
pub struct MbtilesCatalog {
    entries: Vec<(String, PathBuf)>,
    max_connections: u32,
}

impl MbtilesCatalog {
    /// Discover tilesets from files and directories.
    ///
    /// Directories are scanned (non-recursively) for `*.mbtiles` files in
    /// file-name order. A file qualifies when it has both a `tiles` and a
    /// `metadata` table; other files are skipped with a warning. The source
    /// name is the file stem, and the first file to claim a name keeps it.
    pub async fn discover(paths: &[PathBuf], max_connections: u32) -> Result<Self, StorageError> {
        let mut candidates = Vec::new();
        for path in paths {
            let meta = tokio::fs::metadata(path)
                .await
                .map_err(|e| StorageError::Io(format!("{}: {}", path.display(), e)))?;

            if meta.is_dir() {
                candidates.extend(scan_directory(path).await?);
            } else {
                candidates.push(path.clone());
            }
        }

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        for path in candidates {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                warn!(path = %path.display(), "Skipping file without a usable name");
                continue;
            };

            if seen.contains(&name) {
                warn!(
                    name = %name,
                    path = %path.display(),
                    "Skipping tileset: name already taken by an earlier file"
                );
                continue;
            }

            match check_schema(&path).await {
                Ok(()) => {
                    debug!(name = %name, path = %path.display(), "Discovered tileset");
                    seen.insert(name.clone());
                    entries.push((name, path));
                }
                Err(e) => warn!(path = %path.display(), "Skipping file: {}", e),
            }
        }

        info!(count = entries.len(), "Tileset discovery complete");

        Ok(Self {
            entries,
            max_connections,
        })
    }

    /// Discovered `(name, path)` pairs in discovery order.
    pub fn entries(&self) -> &[(String, PathBuf)] {
        &self.entries
    }

    /// Path of the named tileset.
    pub fn path(&self, name: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SourceCatalog for MbtilesCatalog {
    type Source = MbtilesSource;

    async fn source_names(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn open_source(&self, name: &str) -> Result<Self::Source, StorageError> {
        let path = self.path(name).ok_or_else(|| StorageError::InvalidTileset {
            path: name.to_string(),
            reason: "not in catalog".to_string(),
        })?;

        MbtilesSource::open(name, path, self.max_connections).await
    }
}

async fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        if is_mbtiles_path(&path) && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Verify that a file is an SQLite database with the MBTiles tables.
async fn check_schema(path: &Path) -> Result<(), StorageError> {
    let pool = open_pool(path, 1).await?;
    let found = sqlx::query_scalar::<_, String>(SELECT_SCHEMA_SQL)
        .fetch_all(&pool)
        .await;
    pool.close().await;

    // A non-SQLite file surfaces here as a SQL error
    let found = found.map_err(|e| StorageError::InvalidTileset {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    for table in ["tiles", "metadata"] {
        if !found.iter().any(|name| name == table) {
            return Err(StorageError::InvalidTileset {
                path: path.display().to_string(),
                reason: format!("missing `{}` table", table),
            });
        }
    }

    Ok(())
}
