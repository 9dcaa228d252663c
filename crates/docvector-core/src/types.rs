//! Entry, query, and manifest types for the flat index

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Distance metric used for nearest-neighbor ranking
///
/// All metrics are expressed as distances: lower is closer. Dot product is
/// negated so that ascending order still means most similar first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine distance: `1 - cos(a, b)`
    #[default]
    Cosine,
    /// Euclidean (L2) distance
    Euclidean,
    /// Negated dot product
    Dot,
}

impl DistanceMetric {
    /// Compute the distance between two equal-length vectors
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Self::Cosine => {
                let mut dot = 0.0f32;
                let mut norm_a = 0.0f32;
                let mut norm_b = 0.0f32;
                for (x, y) in a.iter().zip(b.iter()) {
                    dot += x * y;
                    norm_a += x * x;
                    norm_b += y * y;
                }
                let denom = norm_a.sqrt() * norm_b.sqrt();
                if denom == 0.0 {
                    1.0
                } else {
                    1.0 - dot / denom
                }
            }
            Self::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            Self::Dot => -a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<f32>(),
        }
    }
}

/// An entry to be inserted into the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    /// Optional external id (e.g. a chunk UUID)
    pub id: Option<String>,
    /// Embedding vector
    pub vector: Vec<f32>,
    /// Opaque metadata carried alongside the vector (chunk text, source)
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl VectorEntry {
    /// Create an entry with an external id and metadata
    pub fn new(
        id: impl Into<String>,
        vector: Vec<f32>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            vector,
            metadata: Some(metadata),
        }
    }
}

/// Nearest-neighbor search parameters
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Query vector; must match the index dimensions
    pub vector: Vec<f32>,
    /// Number of neighbors to return
    pub k: usize,
}

/// A single search result
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Internal insertion-order id
    pub internal_id: u64,
    /// External id, if the entry carried one
    pub id: Option<String>,
    /// Distance from the query vector (lower is closer)
    pub distance: f32,
    /// Metadata stored with the entry
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// Manifest written beside the serialized vectors
///
/// `version` is a commit counter incremented on every successful save; the
/// retrieval layer compares it against the version of its in-memory snapshot
/// instead of polling file modification times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    /// On-disk layout version; readers accept equal or earlier layouts
    pub format_version: u32,
    /// Monotonic commit counter
    pub version: u64,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Distance metric the index was built with
    pub metric: DistanceMetric,
    /// Exact number of entries, tracked at write time
    pub count: usize,
    /// Save timestamp
    pub saved_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let m = DistanceMetric::Cosine;
        let v = vec![0.5, 1.0, -2.0];
        assert!(m.distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        let m = DistanceMetric::Cosine;
        let d = m.distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let m = DistanceMetric::Cosine;
        assert_eq!(m.distance(&[0.0, 0.0], &[1.0, 2.0]), 1.0);
    }

    #[test]
    fn test_euclidean() {
        let m = DistanceMetric::Euclidean;
        let d = m.distance(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_dot_orders_by_similarity() {
        let m = DistanceMetric::Dot;
        let close = m.distance(&[1.0, 1.0], &[1.0, 1.0]);
        let far = m.distance(&[1.0, 1.0], &[-1.0, -1.0]);
        assert!(close < far);
    }
}
