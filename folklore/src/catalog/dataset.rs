//! Raw dataset descriptors and the on-disk catalog.

use crate::catalog::source::{hash_bytes, HashType, SourceFile, SourceRole};
use crate::config::ProjectLayout;
use crate::errors::FolkloreError;
use crate::manifest::{load_json, save_json, Manifest, WorkItem};
use crate::utils::validate_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// A named raw dataset: an ordered list of source files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDataset {
    /// The dataset name.
    pub name: String,
    /// The files making up the dataset, in catalog order.
    #[serde(default)]
    pub file_list: Vec<SourceFile>,
}

impl RawDataset {
    /// Creates an empty dataset descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_list: Vec::new(),
        }
    }

    /// Adds a URL source.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.file_list.push(SourceFile::from_url(url));
        self
    }

    /// Adds a file expected on disk (offline acquisition).
    #[must_use]
    pub fn with_file(mut self, file_name: impl Into<String>) -> Self {
        self.file_list.push(SourceFile::from_path(file_name));
        self
    }

    /// Adds an inline-contents source, typically a description or license.
    #[must_use]
    pub fn with_contents(
        mut self,
        file_name: impl Into<String>,
        contents: impl Into<String>,
        role: SourceRole,
    ) -> Self {
        self.file_list
            .push(SourceFile::from_contents(file_name, contents).with_role(role));
        self
    }

    /// Adds an already-built source descriptor.
    #[must_use]
    pub fn with_source(mut self, source: SourceFile) -> Self {
        self.file_list.push(source);
        self
    }

    /// The data files (role `data`) of this dataset.
    pub fn data_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.file_list
            .iter()
            .filter(|f| f.role == SourceRole::Data)
    }

    /// Validates the descriptor.
    pub fn validate(&self) -> Result<(), FolkloreError> {
        validate_name(&self.name)
            .map_err(|e| FolkloreError::parse(&self.name, e.to_string()))?;
        for file in &self.file_list {
            if file.file_name.trim().is_empty() {
                return Err(FolkloreError::parse(
                    &self.name,
                    "source file with empty file_name",
                ));
            }
        }
        Ok(())
    }

    /// A stable key over the descriptor's canonical JSON form.
    ///
    /// Any change to the file list or hashes yields a new key, which is
    /// how processed outputs detect a stale descriptor.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hash_bytes(HashType::Sha256, &canonical)
    }
}

/// The catalog of raw datasets, persisted as `raw_datasets.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    /// Dataset descriptors by name.
    pub datasets: BTreeMap<String, RawDataset>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the catalog from `path`.
    ///
    /// A missing catalog file is not an error: it yields an empty catalog
    /// with a warning, so a fresh project can run before any dataset has
    /// been registered.
    pub fn load(path: &Path) -> Result<Self, FolkloreError> {
        if !path.exists() {
            warn!(path = %path.display(), "no catalog file found");
            return Ok(Self::new());
        }
        load_json(path)
    }

    /// Saves the catalog atomically.
    pub fn save(&self, path: &Path) -> Result<(), FolkloreError> {
        save_json(path, self)
    }

    /// Adds (or replaces) a dataset descriptor.
    pub fn add(&mut self, dataset: RawDataset) -> Result<(), FolkloreError> {
        dataset.validate()?;
        self.datasets.insert(dataset.name.clone(), dataset);
        Ok(())
    }

    /// Looks up a dataset by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RawDataset> {
        self.datasets.get(name)
    }

    /// The registered dataset names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.datasets.keys().cloned().collect()
    }

    /// Builds a manifest with one work item per dataset, so catalog
    /// stages run through the ordinary stage runner.
    ///
    /// When `only` is non-empty, restricts the manifest to those names;
    /// unknown names still produce items so they surface as failed
    /// records rather than being silently dropped.
    #[must_use]
    pub fn to_manifest(&self, only: &[String]) -> Manifest {
        let names: Vec<String> = if only.is_empty() {
            self.names()
        } else {
            only.to_vec()
        };
        let mut manifest = Manifest::new();
        for name in names {
            manifest = manifest.with_item(WorkItem::new(name));
        }
        manifest
    }
}

/// Lists the names of processed datasets: every `*.metadata` file under
/// the processed directory.
pub fn available_processed(layout: &ProjectLayout) -> Result<Vec<String>, FolkloreError> {
    let dir = layout.processed_dir();
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "metadata") {
            if let Some(stem) = path.file_stem() {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn houses() -> RawDataset {
        RawDataset::new("houses")
            .with_url("https://example.com/houses.csv")
            .with_contents("houses.readme", "House prices.", SourceRole::Description)
    }

    #[test]
    fn test_catalog_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw_datasets.json");

        let mut catalog = Catalog::new();
        catalog.add(houses()).unwrap();
        catalog.save(&path).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(catalog, loaded);
    }

    #[test]
    fn test_missing_catalog_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(&dir.path().join("raw_datasets.json")).unwrap();
        assert!(catalog.datasets.is_empty());
    }

    #[test]
    fn test_add_replaces_by_name() {
        let mut catalog = Catalog::new();
        catalog.add(houses()).unwrap();
        catalog.add(RawDataset::new("houses")).unwrap();

        assert_eq!(catalog.names(), vec!["houses"]);
        assert!(catalog.get("houses").unwrap().file_list.is_empty());
    }

    #[test]
    fn test_add_rejects_bad_names() {
        let mut catalog = Catalog::new();
        assert!(catalog.add(RawDataset::new("../escape")).is_err());
        assert!(catalog.add(RawDataset::new("")).is_err());
    }

    #[test]
    fn test_cache_key_changes_with_descriptor() {
        let a = houses();
        let b = houses().with_file("extra.csv");
        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), houses().cache_key());
    }

    #[test]
    fn test_to_manifest_all_and_subset() {
        let mut catalog = Catalog::new();
        catalog.add(houses()).unwrap();
        catalog.add(RawDataset::new("air_quality")).unwrap();

        let all = catalog.to_manifest(&[]);
        assert_eq!(all.len(), 2);
        // BTreeMap order: air_quality first.
        assert_eq!(all.items[0].name, "air_quality");

        let some = catalog.to_manifest(&["houses".to_string(), "nope".to_string()]);
        assert_eq!(some.len(), 2);
        assert_eq!(some.items[1].name, "nope");
    }

    #[test]
    fn test_available_processed() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        assert!(available_processed(&layout).unwrap().is_empty());

        fs::create_dir_all(layout.processed_dir()).unwrap();
        fs::write(layout.processed_dir().join("houses.metadata"), b"{}").unwrap();
        fs::write(layout.processed_dir().join("junk.txt"), b"").unwrap();

        assert_eq!(available_processed(&layout).unwrap(), vec!["houses"]);
    }
}
