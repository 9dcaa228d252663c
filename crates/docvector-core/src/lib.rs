//! docvector-core: flat vector index with atomic on-disk persistence
//!
//! Stores `(vector, metadata)` entries and answers exact nearest-neighbor
//! queries over them. Indexes grow by `insert`/`merge_from` and are replaced
//! wholesale on rebuild; the persisted directory artifact is swapped
//! atomically so readers observe either the previous or the new index,
//! never a torn one.

pub mod error;
pub mod index;
pub mod persistence;
pub mod types;

pub use error::{DocvectorError, Result};
pub use index::FlatIndex;
pub use persistence::{
    artifact_exists, load_index, peek_manifest, remove_artifact, save_index, FORMAT_VERSION,
};
pub use types::{DistanceMetric, IndexManifest, SearchHit, SearchQuery, VectorEntry};
