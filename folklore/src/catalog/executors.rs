//! Executors for the catalog-driven stages: fetch, unpack, process.
//!
//! Each executor treats the work item name as a dataset name and looks it
//! up in the catalog; unknown datasets become failed records like any
//! other per-item failure.

use crate::catalog::{Catalog, RawDataset};
use crate::config::ProjectLayout;
use crate::errors::WorkItemError;
use crate::manifest::{write_atomic, WorkItem};
use crate::stage::{Executor, ItemOutput};
use crate::utils::iso_timestamp;
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use tracing::debug;

fn lookup<'a>(
    catalog: &'a Catalog,
    item: &WorkItem,
) -> Result<&'a RawDataset, WorkItemError> {
    catalog
        .get(&item.name)
        .ok_or_else(|| WorkItemError::new(&item.name, "dataset not present in catalog"))
}

/// Fetches a dataset's source files into the raw data directory.
///
/// Files already on disk are verified rather than re-downloaded; inline
/// contents are materialized; URL sources are downloaded when the crate
/// is built with the `fetch` feature.
#[derive(Debug, Clone)]
pub struct FetchExecutor {
    layout: ProjectLayout,
    catalog: Catalog,
}

impl FetchExecutor {
    /// Creates a fetch executor over the given layout and catalog.
    #[must_use]
    pub fn new(layout: ProjectLayout, catalog: Catalog) -> Self {
        Self { layout, catalog }
    }
}

#[async_trait]
impl Executor for FetchExecutor {
    async fn execute(&self, item: &WorkItem) -> Result<ItemOutput, WorkItemError> {
        let dataset = lookup(&self.catalog, item)?;
        let raw_dir = self.layout.raw_dir();
        fs::create_dir_all(&raw_dir)
            .map_err(|e| WorkItemError::new(&item.name, format!("create raw dir: {e}")))?;

        let mut output = ItemOutput::empty();
        for source in &dataset.file_list {
            let dest = raw_dir.join(&source.file_name);

            if let Some(contents) = &source.contents {
                if !dest.exists() {
                    fs::write(&dest, contents.as_bytes()).map_err(|e| {
                        WorkItemError::new(&item.name, format!("write {}: {e}", source.file_name))
                    })?;
                }
            } else if !dest.exists() {
                let Some(url) = &source.url else {
                    return Err(WorkItemError::new(
                        &item.name,
                        format!("'{}' is missing and has no url", source.file_name),
                    ));
                };
                #[cfg(feature = "fetch")]
                {
                    debug!(dataset = %dataset.name, url = %url, "downloading");
                    crate::catalog::download(url, &dest)
                        .await
                        .map_err(|e| WorkItemError::new(&item.name, e.to_string()))?;
                }
                #[cfg(not(feature = "fetch"))]
                {
                    return Err(WorkItemError::new(
                        &item.name,
                        format!("'{url}' cannot be fetched: built without the 'fetch' feature"),
                    ));
                }
            }

            let verified = source
                .verify(&raw_dir)
                .map_err(|e| WorkItemError::new(&item.name, e.to_string()))?;
            if !verified {
                return Err(WorkItemError::new(
                    &item.name,
                    format!("hash mismatch for '{}'", source.file_name),
                ));
            }
            output = output.with_artifact(dest);
        }
        Ok(output)
    }
}

/// Materializes a dataset's fetched data files into
/// `data/interim/<dataset>/`.
///
/// Archive expansion belongs to the external command a caller can
/// configure; this executor copies files as-is.
#[derive(Debug, Clone)]
pub struct UnpackExecutor {
    layout: ProjectLayout,
    catalog: Catalog,
}

impl UnpackExecutor {
    /// Creates an unpack executor over the given layout and catalog.
    #[must_use]
    pub fn new(layout: ProjectLayout, catalog: Catalog) -> Self {
        Self { layout, catalog }
    }
}

#[async_trait]
impl Executor for UnpackExecutor {
    async fn execute(&self, item: &WorkItem) -> Result<ItemOutput, WorkItemError> {
        let dataset = lookup(&self.catalog, item)?;
        let raw_dir = self.layout.raw_dir();
        let dest_dir = self.layout.interim_dir().join(&dataset.name);
        fs::create_dir_all(&dest_dir)
            .map_err(|e| WorkItemError::new(&item.name, format!("create interim dir: {e}")))?;

        let mut output = ItemOutput::empty();
        for source in dataset.data_files() {
            let from = raw_dir.join(&source.file_name);
            if !from.exists() {
                return Err(WorkItemError::new(
                    &item.name,
                    format!("'{}' has not been fetched", source.file_name),
                ));
            }
            let to = dest_dir.join(&source.file_name);
            fs::copy(&from, &to).map_err(|e| {
                WorkItemError::new(&item.name, format!("copy {}: {e}", source.file_name))
            })?;
            debug!(dataset = %dataset.name, file = %source.file_name, "unpacked");
            output = output.with_artifact(to);
        }
        Ok(output)
    }
}

/// Writes a dataset's processed metadata artifact into
/// `data/processed/<dataset>.metadata`.
///
/// The metadata records the descriptor, its cache key, and per-file
/// hashes; an up-to-date artifact (matching cache key) is left untouched.
/// The numeric payload itself is produced by external load functions and
/// is not folklore's concern.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    layout: ProjectLayout,
    catalog: Catalog,
}

impl ProcessExecutor {
    /// Creates a process executor over the given layout and catalog.
    #[must_use]
    pub fn new(layout: ProjectLayout, catalog: Catalog) -> Self {
        Self { layout, catalog }
    }

    fn metadata_path(&self, dataset: &RawDataset) -> std::path::PathBuf {
        self.layout
            .processed_dir()
            .join(format!("{}.metadata", dataset.name))
    }

    fn is_cached(path: &Path, cache_key: &str) -> bool {
        let Ok(bytes) = fs::read(path) else {
            return false;
        };
        let Ok(existing) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
            return false;
        };
        existing["cache_key"] == cache_key
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(&self, item: &WorkItem) -> Result<ItemOutput, WorkItemError> {
        let dataset = lookup(&self.catalog, item)?;
        let path = self.metadata_path(dataset);
        let cache_key = dataset.cache_key();

        if Self::is_cached(&path, &cache_key) {
            debug!(dataset = %dataset.name, "processed metadata up to date");
            return Ok(ItemOutput::artifact(path));
        }

        let interim = self.layout.interim_dir().join(&dataset.name);
        let mut hashes = serde_json::Map::new();
        for source in dataset.data_files() {
            let hash = source
                .compute_hash(&interim)
                .map_err(|e| WorkItemError::new(&item.name, e.to_string()))?;
            hashes.insert(
                source.file_name.clone(),
                serde_json::json!({ "hash_type": source.hash_type, "hash_value": hash }),
            );
        }

        let metadata = serde_json::json!({
            "dataset_name": dataset.name,
            "cache_key": cache_key,
            "hashes": hashes,
            "descriptor": dataset,
            "created_at": iso_timestamp(),
        });

        let bytes = serde_json::to_vec_pretty(&metadata)
            .map_err(|e| WorkItemError::new(&item.name, format!("serialize metadata: {e}")))?;
        write_atomic(&path, &bytes)
            .map_err(|e| WorkItemError::new(&item.name, e.to_string()))?;

        Ok(ItemOutput::artifact(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{HashType, SourceFile, SourceRole};
    use crate::catalog::source::hash_bytes;

    const CSV: &[u8] = b"a,b\n1,2\n";

    fn fixture() -> (tempfile::TempDir, ProjectLayout, Catalog) {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let mut catalog = Catalog::new();
        catalog
            .add(
                RawDataset::new("houses")
                    .with_source(
                        SourceFile::from_path("houses.csv")
                            .with_hash(HashType::Sha256, hash_bytes(HashType::Sha256, CSV)),
                    )
                    .with_contents("houses.readme", "House prices.", SourceRole::Description),
            )
            .unwrap();
        (dir, layout, catalog)
    }

    fn put_raw(layout: &ProjectLayout) {
        fs::create_dir_all(layout.raw_dir()).unwrap();
        fs::write(layout.raw_dir().join("houses.csv"), CSV).unwrap();
    }

    #[tokio::test]
    async fn test_fetch_verifies_existing_files_and_writes_contents() {
        let (_dir, layout, catalog) = fixture();
        put_raw(&layout);

        let exec = FetchExecutor::new(layout.clone(), catalog);
        let out = exec.execute(&WorkItem::new("houses")).await.unwrap();

        assert_eq!(out.artifacts.len(), 2);
        assert!(layout.raw_dir().join("houses.readme").exists());
    }

    #[tokio::test]
    async fn test_fetch_detects_corruption() {
        let (_dir, layout, catalog) = fixture();
        fs::create_dir_all(layout.raw_dir()).unwrap();
        fs::write(layout.raw_dir().join("houses.csv"), b"tampered").unwrap();

        let exec = FetchExecutor::new(layout, catalog);
        let err = exec.execute(&WorkItem::new("houses")).await.unwrap_err();
        assert!(err.message.contains("hash mismatch"));
    }

    #[tokio::test]
    async fn test_fetch_unknown_dataset() {
        let (_dir, layout, catalog) = fixture();
        let exec = FetchExecutor::new(layout, catalog);
        let err = exec.execute(&WorkItem::new("nope")).await.unwrap_err();
        assert!(err.message.contains("catalog"));
    }

    #[tokio::test]
    async fn test_unpack_copies_data_files_only() {
        let (_dir, layout, catalog) = fixture();
        put_raw(&layout);

        let exec = UnpackExecutor::new(layout.clone(), catalog);
        let out = exec.execute(&WorkItem::new("houses")).await.unwrap();

        assert_eq!(out.artifacts.len(), 1);
        let unpacked = layout.interim_dir().join("houses").join("houses.csv");
        assert!(unpacked.exists());
        // The readme is metadata, not data; it stays in raw.
        assert!(!layout.interim_dir().join("houses").join("houses.readme").exists());
    }

    #[tokio::test]
    async fn test_unpack_before_fetch_fails() {
        let (_dir, layout, catalog) = fixture();
        let exec = UnpackExecutor::new(layout, catalog);
        let err = exec.execute(&WorkItem::new("houses")).await.unwrap_err();
        assert!(err.message.contains("not been fetched"));
    }

    #[tokio::test]
    async fn test_process_writes_metadata_and_caches() {
        let (_dir, layout, catalog) = fixture();
        put_raw(&layout);

        let unpack = UnpackExecutor::new(layout.clone(), catalog.clone());
        unpack.execute(&WorkItem::new("houses")).await.unwrap();

        let exec = ProcessExecutor::new(layout.clone(), catalog);
        let out = exec.execute(&WorkItem::new("houses")).await.unwrap();

        let path = layout.processed_dir().join("houses.metadata");
        assert_eq!(out.artifacts, vec![path.clone()]);

        let metadata: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(metadata["dataset_name"], "houses");
        assert!(metadata["hashes"]["houses.csv"]["hash_value"].is_string());

        // Second run is a cache hit: the artifact's mtime must not change.
        let before = fs::metadata(&path).unwrap().modified().unwrap();
        exec.execute(&WorkItem::new("houses")).await.unwrap();
        let after = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_process_before_unpack_fails() {
        let (_dir, layout, catalog) = fixture();
        put_raw(&layout);

        let exec = ProcessExecutor::new(layout, catalog);
        let err = exec.execute(&WorkItem::new("houses")).await.unwrap_err();
        assert!(err.message.contains("Not found"));
    }
}
