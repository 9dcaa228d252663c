//! Versioned index store
//!
//! Owns the persisted artifact directory and an immutable in-memory
//! snapshot. Writers build and persist a whole new index, then swap the
//! snapshot reference; readers clone the `Arc` at query start and keep it
//! for the duration of the query. Staleness is decided by comparing the
//! persisted manifest's commit counter against the snapshot's, never by
//! file modification times.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use docvector_core::{
    artifact_exists, load_index, peek_manifest, remove_artifact, save_index, DistanceMetric,
    FlatIndex, IndexManifest, SearchQuery, VectorEntry,
};

use crate::error::{Error, Result};
use crate::types::Chunk;

/// An immutable, versioned view of the loaded index
pub struct IndexSnapshot {
    index: FlatIndex,
    /// Commit counter from the manifest this snapshot was loaded at
    pub version: u64,
    /// Entry count tracked at write time
    pub count: usize,
}

/// A chunk retrieved by similarity search
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// The retrieved chunk, rebuilt from index metadata
    pub chunk: Chunk,
    /// Distance from the query vector (lower is closer)
    pub distance: f32,
}

/// Store managing the persisted index and its in-memory snapshot
pub struct IndexStore {
    index_dir: PathBuf,
    dimensions: usize,
    metric: DistanceMetric,
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl IndexStore {
    /// Create a store over an index directory
    pub fn new(index_dir: PathBuf, dimensions: usize) -> Self {
        Self {
            index_dir,
            dimensions,
            metric: DistanceMetric::Cosine,
            snapshot: RwLock::new(None),
        }
    }

    /// Check whether a persisted index exists
    pub fn exists(&self) -> bool {
        artifact_exists(&self.index_dir)
    }

    /// Resolve the freshest snapshot, reloading from disk when the
    /// persisted version is newer than the in-memory one (or when forced)
    pub fn resolve(&self, force_reload: bool) -> Result<Arc<IndexSnapshot>> {
        if !self.exists() {
            *self.snapshot.write() = None;
            return Err(Error::IndexUnavailable);
        }

        let manifest = peek_manifest(&self.index_dir)?;

        if !force_reload {
            let guard = self.snapshot.read();
            if let Some(snapshot) = guard.as_ref() {
                if snapshot.version >= manifest.version {
                    return Ok(Arc::clone(snapshot));
                }
            }
        }

        let (index, manifest) = load_index(&self.index_dir)?;
        let snapshot = Arc::new(IndexSnapshot {
            index,
            version: manifest.version,
            count: manifest.count,
        });
        *self.snapshot.write() = Some(Arc::clone(&snapshot));
        tracing::info!(
            "Index snapshot loaded (v{}, {} chunks)",
            snapshot.version,
            snapshot.count
        );

        Ok(snapshot)
    }

    /// Drop the in-memory snapshot; the next resolve reloads from disk
    pub fn invalidate(&self) {
        *self.snapshot.write() = None;
    }

    /// Entry count from the manifest of the resolved snapshot
    pub fn count(&self) -> Result<usize> {
        Ok(self.resolve(false)?.count)
    }

    /// Merge new entries into the persisted index, creating it when absent
    ///
    /// Loads the freshest persisted index (not the cached snapshot) as the
    /// merge base so concurrent saves are never silently dropped.
    pub fn merge_or_create(&self, entries: Vec<VectorEntry>) -> Result<IndexManifest> {
        let transient = FlatIndex::from_entries(self.dimensions, self.metric, entries)?;

        let (mut base, version) = if self.exists() {
            let (index, manifest) = load_index(&self.index_dir)?;
            (index, manifest.version)
        } else {
            (FlatIndex::new(self.dimensions, self.metric)?, 0)
        };

        base.merge_from(transient)?;
        let manifest = save_index(&base, &self.index_dir, version + 1)?;
        self.publish(base, &manifest);

        Ok(manifest)
    }

    /// Replace the persisted index with one built from `entries`
    pub fn rebuild(&self, entries: Vec<VectorEntry>) -> Result<IndexManifest> {
        let version = peek_manifest(&self.index_dir)
            .map(|m| m.version)
            .unwrap_or(0);

        let index = FlatIndex::from_entries(self.dimensions, self.metric, entries)?;
        let manifest = save_index(&index, &self.index_dir, version + 1)?;
        self.publish(index, &manifest);

        Ok(manifest)
    }

    /// Remove the persisted artifact and the in-memory snapshot
    pub fn remove(&self) -> Result<()> {
        remove_artifact(&self.index_dir)?;
        self.invalidate();
        Ok(())
    }

    /// Nearest-neighbor search against a resolved snapshot
    pub fn search(
        &self,
        snapshot: &IndexSnapshot,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let hits = snapshot.index.search(&SearchQuery {
            vector: embedding.to_vec(),
            k,
        })?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                hit.metadata.as_ref().map(|meta| RetrievedChunk {
                    chunk: Chunk::from_vector_metadata(meta),
                    distance: hit.distance,
                })
            })
            .collect())
    }

    fn publish(&self, index: FlatIndex, manifest: &IndexManifest) {
        *self.snapshot.write() = Some(Arc::new(IndexSnapshot {
            index,
            version: manifest.version,
            count: manifest.count,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkSource, DocumentFormat};

    fn entry(text: &str, vector: Vec<f32>) -> VectorEntry {
        let source = ChunkSource::whole_file("test.txt".to_string(), DocumentFormat::Text);
        let chunk = Chunk::new(text.to_string(), source, 0, 0);
        VectorEntry::new(chunk.id.to_string(), vector, chunk.to_vector_metadata())
    }

    #[test]
    fn test_resolve_without_artifact_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(tmp.path().join("index"), 2);
        assert!(matches!(store.resolve(false), Err(Error::IndexUnavailable)));
    }

    #[test]
    fn test_merge_then_count() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(tmp.path().join("index"), 2);

        store
            .merge_or_create(vec![entry("a", vec![1.0, 0.0]), entry("b", vec![0.0, 1.0])])
            .unwrap();
        assert_eq!(store.count().unwrap(), 2);

        store
            .merge_or_create(vec![entry("c", vec![1.0, 1.0])])
            .unwrap();
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_rebuild_shrinks_index() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(tmp.path().join("index"), 2);

        store
            .merge_or_create(vec![entry("a", vec![1.0, 0.0]), entry("b", vec![0.0, 1.0])])
            .unwrap();
        store.rebuild(vec![entry("only", vec![1.0, 1.0])]).unwrap();

        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_version_increments_per_save() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(tmp.path().join("index"), 2);

        let m1 = store.merge_or_create(vec![entry("a", vec![1.0, 0.0])]).unwrap();
        let m2 = store.merge_or_create(vec![entry("b", vec![0.0, 1.0])]).unwrap();
        let m3 = store.rebuild(vec![entry("c", vec![1.0, 1.0])]).unwrap();

        assert_eq!(m1.version, 1);
        assert_eq!(m2.version, 2);
        assert_eq!(m3.version, 3);
    }

    #[test]
    fn test_stale_snapshot_reloads() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("index");

        let reader = IndexStore::new(dir.clone(), 2);
        let writer = IndexStore::new(dir, 2);

        writer
            .merge_or_create(vec![entry("a", vec![1.0, 0.0])])
            .unwrap();
        let first = reader.resolve(false).unwrap();
        assert_eq!(first.version, 1);

        // Another process commits a newer index.
        writer
            .merge_or_create(vec![entry("b", vec![0.0, 1.0])])
            .unwrap();
        let second = reader.resolve(false).unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(second.count, 2);

        // Readers holding the old snapshot still see a consistent view.
        assert_eq!(first.count, 1);
    }

    #[test]
    fn test_search_returns_chunks_with_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(tmp.path().join("index"), 2);

        store
            .merge_or_create(vec![
                entry("near the query", vec![1.0, 0.0]),
                entry("far away", vec![0.0, 1.0]),
            ])
            .unwrap();

        let snapshot = store.resolve(false).unwrap();
        let results = store.search(&snapshot, &[1.0, 0.1], 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content, "near the query");
        assert_eq!(results[0].chunk.source.filename, "test.txt");
    }

    #[test]
    fn test_remove_invalidates() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(tmp.path().join("index"), 2);

        store
            .merge_or_create(vec![entry("a", vec![1.0, 0.0])])
            .unwrap();
        store.remove().unwrap();

        assert!(!store.exists());
        assert!(matches!(store.resolve(false), Err(Error::IndexUnavailable)));
    }
}
