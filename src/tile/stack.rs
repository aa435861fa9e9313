//! Priority-ordered stacks of tile sources.

use std::sync::Arc;

use serde::Serialize;

use crate::error::StorageError;
use crate::source::{TileSource, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};

/// An ordered list of opened sources, highest priority first.
///
/// The order is exactly the order supplied at construction; the stack
/// never reorders, deduplicates, or merges. Tile lookups go through
/// [`TileService::get_stack_tile`](super::TileService::get_stack_tile),
/// which opens members only as they are reached.
pub struct SourceStack<S> {
    sources: Vec<Arc<S>>,
}

impl<S> Clone for SourceStack<S> {
    fn clone(&self) -> Self {
        Self {
            sources: self.sources.clone(),
        }
    }
}

/// Display-only summary of a stack: zoom envelope and shared attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackSummary {
    /// Minimum of the members' declared minimum zooms
    pub min_zoom: u8,

    /// Maximum of the members' declared maximum zooms
    pub max_zoom: u8,

    /// Attribution shared by every member, or empty when they disagree
    pub attribution: String,
}

impl<S: TileSource> SourceStack<S> {
    pub fn new(sources: Vec<Arc<S>>) -> Self {
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Member names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Compute the zoom envelope and common attribution of the members.
    ///
    /// Members without declared zooms do not narrow the envelope; when no
    /// member declares one the defaults apply.
    pub async fn summary(&self) -> Result<StackSummary, StorageError> {
        let mut min_zooms = Vec::new();
        let mut max_zooms = Vec::new();
        let mut attributions = Vec::new();

        for source in &self.sources {
            let metadata = source.metadata().await?;
            min_zooms.extend(metadata.min_zoom());
            max_zooms.extend(metadata.max_zoom());
            attributions.push(metadata.attribution().map(str::to_string));
        }

        let attribution = match attributions.split_first() {
            Some((Some(first), rest))
                if rest.iter().all(|a| a.as_deref() == Some(first.as_str())) =>
            {
                first.clone()
            }
            _ => String::new(),
        };

        Ok(StackSummary {
            min_zoom: min_zooms.into_iter().min().unwrap_or(DEFAULT_MIN_ZOOM),
            max_zoom: max_zooms.into_iter().max().unwrap_or(DEFAULT_MAX_ZOOM),
            attribution,
        })
    }
}
