//! Exact nearest-neighbor index over in-memory entries

use rayon::prelude::*;

use crate::error::{DocvectorError, Result};
use crate::types::{DistanceMetric, SearchHit, SearchQuery, VectorEntry};

/// Entry count above which the search scan is parallelized
const PARALLEL_SCAN_THRESHOLD: usize = 4096;

/// A stored entry with its insertion-order id
#[derive(Debug, Clone)]
pub(crate) struct StoredEntry {
    pub internal_id: u64,
    pub id: Option<String>,
    pub vector: Vec<f32>,
    pub metadata: Option<std::collections::HashMap<String, serde_json::Value>>,
}

/// Flat (exhaustive-scan) vector index
///
/// Append-only at chunk granularity: entries are inserted or merged in, and
/// removal is only possible by rebuilding from scratch. Ties in search
/// distance are broken by insertion order, so results are stable across
/// runs for identical content.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimensions: usize,
    metric: DistanceMetric,
    entries: Vec<StoredEntry>,
    next_internal_id: u64,
}

impl FlatIndex {
    /// Create an empty index
    pub fn new(dimensions: usize, metric: DistanceMetric) -> Result<Self> {
        if dimensions == 0 {
            return Err(DocvectorError::InvalidDimensions(dimensions));
        }
        Ok(Self {
            dimensions,
            metric,
            entries: Vec::new(),
            next_internal_id: 0,
        })
    }

    /// Build an index from an initial batch of entries
    pub fn from_entries(
        dimensions: usize,
        metric: DistanceMetric,
        entries: Vec<VectorEntry>,
    ) -> Result<Self> {
        let mut index = Self::new(dimensions, metric)?;
        for entry in entries {
            index.insert(entry)?;
        }
        Ok(index)
    }

    /// Embedding dimensions this index was built with
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Distance metric this index ranks with
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a single entry, assigning the next insertion-order id
    pub fn insert(&mut self, entry: VectorEntry) -> Result<u64> {
        if entry.vector.len() != self.dimensions {
            return Err(DocvectorError::DimensionMismatch {
                expected: self.dimensions,
                actual: entry.vector.len(),
            });
        }

        let internal_id = self.next_internal_id;
        self.entries.push(StoredEntry {
            internal_id,
            id: entry.id,
            vector: entry.vector,
            metadata: entry.metadata,
        });
        self.next_internal_id += 1;

        Ok(internal_id)
    }

    /// Merge another index into this one, consuming it
    ///
    /// The other index's entries keep their relative order but are assigned
    /// fresh insertion ids continuing this index's sequence.
    pub fn merge_from(&mut self, other: FlatIndex) -> Result<usize> {
        if other.dimensions != self.dimensions {
            return Err(DocvectorError::DimensionMismatch {
                expected: self.dimensions,
                actual: other.dimensions,
            });
        }

        let merged = other.entries.len();
        self.entries.reserve(merged);
        for entry in other.entries {
            let internal_id = self.next_internal_id;
            self.next_internal_id += 1;
            self.entries.push(StoredEntry {
                internal_id,
                ..entry
            });
        }

        tracing::debug!("Merged {} entries, index now holds {}", merged, self.len());
        Ok(merged)
    }

    /// Exact nearest-neighbor search
    ///
    /// Returns up to `k` hits ordered by ascending distance; equal distances
    /// are ordered by insertion id.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        if query.vector.len() != self.dimensions {
            return Err(DocvectorError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.vector.len(),
            });
        }
        if query.k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let metric = self.metric;
        let qv = query.vector.as_slice();

        let mut scored: Vec<(f32, usize)> = if self.entries.len() >= PARALLEL_SCAN_THRESHOLD {
            self.entries
                .par_iter()
                .enumerate()
                .map(|(pos, e)| (metric.distance(qv, &e.vector), pos))
                .collect()
        } else {
            self.entries
                .iter()
                .enumerate()
                .map(|(pos, e)| (metric.distance(qv, &e.vector), pos))
                .collect()
        };

        scored.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then_with(|| self.entries[a.1].internal_id.cmp(&self.entries[b.1].internal_id))
        });
        scored.truncate(query.k);

        Ok(scored
            .into_iter()
            .map(|(distance, pos)| {
                let e = &self.entries[pos];
                SearchHit {
                    internal_id: e.internal_id,
                    id: e.id.clone(),
                    distance,
                    metadata: e.metadata.clone(),
                }
            })
            .collect())
    }

    pub(crate) fn entries(&self) -> &[StoredEntry] {
        &self.entries
    }

    pub(crate) fn next_internal_id(&self) -> u64 {
        self.next_internal_id
    }

    /// Reassemble an index from persisted parts
    pub(crate) fn from_stored(
        dimensions: usize,
        metric: DistanceMetric,
        entries: Vec<StoredEntry>,
        next_internal_id: u64,
    ) -> Result<Self> {
        if dimensions == 0 {
            return Err(DocvectorError::InvalidDimensions(dimensions));
        }
        for entry in &entries {
            if entry.vector.len() != dimensions {
                return Err(DocvectorError::DimensionMismatch {
                    expected: dimensions,
                    actual: entry.vector.len(),
                });
            }
        }
        Ok(Self {
            dimensions,
            metric,
            entries,
            next_internal_id,
        })
    }
}
