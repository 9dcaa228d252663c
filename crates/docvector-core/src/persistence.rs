//! Atomic directory persistence for flat indexes
//!
//! The artifact is a directory holding `vectors.bin` (bincode-serialized
//! embedding payload), `docstore.json` (entry ids and metadata), and
//! `manifest.json`. Saves are staged in a sibling temp directory and
//! published with a rename swap, so a reader loading concurrently sees
//! either the previous artifact or the new one in full.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{DocvectorError, Result};
use crate::index::{FlatIndex, StoredEntry};
use crate::types::{DistanceMetric, IndexManifest};

/// Current on-disk layout version
pub const FORMAT_VERSION: u32 = 1;

const VECTORS_FILE: &str = "vectors.bin";
const DOCSTORE_FILE: &str = "docstore.json";
const MANIFEST_FILE: &str = "manifest.json";

/// Binary payload: everything bincode handles without a self-describing
/// format. Metadata goes to the JSON docstore instead.
#[derive(Serialize, Deserialize)]
struct VectorPayload {
    dimensions: usize,
    metric: DistanceMetric,
    next_internal_id: u64,
    internal_ids: Vec<u64>,
    vectors: Vec<Vec<f32>>,
}

/// One docstore record, aligned with the vector payload by position
#[derive(Serialize, Deserialize)]
struct DocstoreEntry {
    internal_id: u64,
    id: Option<String>,
    metadata: Option<HashMap<String, serde_json::Value>>,
}

/// Check whether a complete artifact exists at `dir`
pub fn artifact_exists(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
        && dir.join(VECTORS_FILE).is_file()
        && dir.join(DOCSTORE_FILE).is_file()
}

/// Persist an index to `dir`, replacing any previous artifact atomically
///
/// `version` is the commit counter to stamp into the manifest; callers
/// increment it on every save so staleness checks never rely on file
/// modification times.
pub fn save_index(index: &FlatIndex, dir: &Path, version: u64) -> Result<IndexManifest> {
    let parent = dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let manifest = IndexManifest {
        format_version: FORMAT_VERSION,
        version,
        dimensions: index.dimensions(),
        metric: index.metric(),
        count: index.len(),
        saved_at: Utc::now(),
    };

    let mut payload = VectorPayload {
        dimensions: index.dimensions(),
        metric: index.metric(),
        next_internal_id: index.next_internal_id(),
        internal_ids: Vec::with_capacity(index.len()),
        vectors: Vec::with_capacity(index.len()),
    };
    let mut docstore = Vec::with_capacity(index.len());
    for entry in index.entries() {
        payload.internal_ids.push(entry.internal_id);
        payload.vectors.push(entry.vector.clone());
        docstore.push(DocstoreEntry {
            internal_id: entry.internal_id,
            id: entry.id.clone(),
            metadata: entry.metadata.clone(),
        });
    }

    // Stage in a sibling directory so the final rename stays on one filesystem.
    let staging = tempfile::Builder::new()
        .prefix(".docvector-staging-")
        .tempdir_in(parent)?;

    let encoded = bincode::serde::encode_to_vec(&payload, bincode::config::standard())
        .map_err(|e| DocvectorError::serialization(e.to_string()))?;
    fs::write(staging.path().join(VECTORS_FILE), encoded)?;
    fs::write(
        staging.path().join(DOCSTORE_FILE),
        serde_json::to_vec(&docstore).map_err(|e| DocvectorError::serialization(e.to_string()))?,
    )?;
    fs::write(
        staging.path().join(MANIFEST_FILE),
        serde_json::to_vec_pretty(&manifest)
            .map_err(|e| DocvectorError::serialization(e.to_string()))?,
    )?;

    let staging_path = staging.into_path();

    if dir.exists() {
        let retired = parent.join(format!(".docvector-retired-{}", version));
        if retired.exists() {
            fs::remove_dir_all(&retired)?;
        }
        fs::rename(dir, &retired)?;
        if let Err(e) = fs::rename(&staging_path, dir) {
            // Publishing failed; put the previous artifact back.
            let _ = fs::rename(&retired, dir);
            let _ = fs::remove_dir_all(&staging_path);
            return Err(e.into());
        }
        let _ = fs::remove_dir_all(&retired);
    } else {
        fs::rename(&staging_path, dir)?;
    }

    tracing::info!(
        "Saved index v{} ({} entries, {} dims) to {}",
        manifest.version,
        manifest.count,
        manifest.dimensions,
        dir.display()
    );

    Ok(manifest)
}

/// Load an index and its manifest from `dir`
pub fn load_index(dir: &Path) -> Result<(FlatIndex, IndexManifest)> {
    let manifest = peek_manifest(dir)?;

    let bytes = fs::read(dir.join(VECTORS_FILE))?;
    let (payload, _): (VectorPayload, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| DocvectorError::corrupt(format!("failed to decode vectors: {}", e)))?;

    let docstore_bytes = fs::read(dir.join(DOCSTORE_FILE))?;
    let docstore: Vec<DocstoreEntry> = serde_json::from_slice(&docstore_bytes)
        .map_err(|e| DocvectorError::corrupt(format!("failed to parse docstore: {}", e)))?;

    if payload.internal_ids.len() != payload.vectors.len()
        || payload.vectors.len() != docstore.len()
    {
        return Err(DocvectorError::corrupt(format!(
            "vector payload ({}) and docstore ({}) disagree",
            payload.vectors.len(),
            docstore.len()
        )));
    }
    if docstore.len() != manifest.count {
        return Err(DocvectorError::corrupt(format!(
            "manifest count {} does not match {} stored entries",
            manifest.count,
            docstore.len()
        )));
    }

    let mut entries = Vec::with_capacity(docstore.len());
    for ((internal_id, vector), record) in payload
        .internal_ids
        .into_iter()
        .zip(payload.vectors)
        .zip(docstore)
    {
        if record.internal_id != internal_id {
            return Err(DocvectorError::corrupt(format!(
                "docstore id {} does not match vector id {}",
                record.internal_id, internal_id
            )));
        }
        entries.push(StoredEntry {
            internal_id,
            id: record.id,
            vector,
            metadata: record.metadata,
        });
    }

    let index = FlatIndex::from_stored(
        payload.dimensions,
        payload.metric,
        entries,
        payload.next_internal_id,
    )?;

    if index.dimensions() != manifest.dimensions {
        return Err(DocvectorError::corrupt(format!(
            "manifest dimensions {} do not match index dimensions {}",
            manifest.dimensions,
            index.dimensions()
        )));
    }

    Ok((index, manifest))
}

/// Read only the manifest — a cheap staleness probe for the retrieval layer
pub fn peek_manifest(dir: &Path) -> Result<IndexManifest> {
    let path = dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Err(DocvectorError::ArtifactNotFound(dir.display().to_string()));
    }

    let bytes = fs::read(&path)?;
    let manifest: IndexManifest = serde_json::from_slice(&bytes)
        .map_err(|e| DocvectorError::corrupt(format!("failed to parse manifest: {}", e)))?;

    if manifest.format_version > FORMAT_VERSION {
        return Err(DocvectorError::IncompatibleFormat {
            found: manifest.format_version,
            supported: FORMAT_VERSION,
        });
    }

    Ok(manifest)
}

/// Delete the artifact directory if present
pub fn remove_artifact(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
        tracing::info!("Removed index artifact at {}", dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SearchQuery, VectorEntry};

    fn sample_index() -> FlatIndex {
        let mut index = FlatIndex::new(3, DistanceMetric::Cosine).unwrap();
        for i in 0..10 {
            let mut metadata = HashMap::new();
            metadata.insert("content".to_string(), serde_json::json!(format!("c{}", i)));
            index
                .insert(VectorEntry::new(
                    format!("chunk-{}", i),
                    vec![i as f32, (i * 2) as f32, 1.0],
                    metadata,
                ))
                .unwrap();
        }
        index
    }

    #[test]
    fn test_save_load_roundtrip_preserves_search() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("index");

        let index = sample_index();
        save_index(&index, &dir, 1).unwrap();
        let (loaded, manifest) = load_index(&dir).unwrap();

        assert_eq!(manifest.version, 1);
        assert_eq!(manifest.count, index.len());

        let query = SearchQuery {
            vector: vec![4.0, 8.0, 1.0],
            k: 5,
        };
        let before: Vec<_> = index
            .search(&query)
            .unwrap()
            .into_iter()
            .map(|h| (h.internal_id, h.id))
            .collect();
        let after: Vec<_> = loaded
            .search(&query)
            .unwrap()
            .into_iter()
            .map(|h| (h.internal_id, h.id))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_roundtrip_preserves_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("index");

        save_index(&sample_index(), &dir, 1).unwrap();
        let (loaded, _) = load_index(&dir).unwrap();

        let hits = loaded
            .search(&SearchQuery {
                vector: vec![0.0, 0.0, 1.0],
                k: 1,
            })
            .unwrap();
        let metadata = hits[0].metadata.as_ref().unwrap();
        assert!(metadata.contains_key("content"));
    }

    #[test]
    fn test_save_replaces_previous_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("index");

        let index = sample_index();
        save_index(&index, &dir, 1).unwrap();

        let mut grown = index.clone();
        let mut extra = FlatIndex::new(3, DistanceMetric::Cosine).unwrap();
        extra
            .insert(VectorEntry::new("extra", vec![1.0, 1.0, 1.0], HashMap::new()))
            .unwrap();
        grown.merge_from(extra).unwrap();
        save_index(&grown, &dir, 2).unwrap();

        let (loaded, manifest) = load_index(&dir).unwrap();
        assert_eq!(manifest.version, 2);
        assert_eq!(loaded.len(), 11);
    }

    #[test]
    fn test_peek_manifest_missing_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let err = peek_manifest(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, DocvectorError::ArtifactNotFound(_)));
    }

    #[test]
    fn test_load_rejects_newer_format() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("index");
        save_index(&sample_index(), &dir, 1).unwrap();

        let mut manifest = peek_manifest(&dir).unwrap();
        manifest.format_version = FORMAT_VERSION + 1;
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).unwrap(),
        )
        .unwrap();

        let err = load_index(&dir).unwrap_err();
        assert!(matches!(err, DocvectorError::IncompatibleFormat { .. }));
    }

    #[test]
    fn test_load_rejects_truncated_docstore() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("index");
        save_index(&sample_index(), &dir, 1).unwrap();

        fs::write(dir.join(DOCSTORE_FILE), b"[]").unwrap();
        let err = load_index(&dir).unwrap_err();
        assert!(matches!(err, DocvectorError::Corrupt(_)));
    }

    #[test]
    fn test_remove_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("index");
        save_index(&sample_index(), &dir, 1).unwrap();
        assert!(artifact_exists(&dir));

        remove_artifact(&dir).unwrap();
        assert!(!artifact_exists(&dir));
        // Removing an absent artifact is a no-op.
        remove_artifact(&dir).unwrap();
    }
}
