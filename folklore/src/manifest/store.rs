//! The manifest store: on-disk manifests and atomic JSON persistence.
//!
//! All JSON files folklore writes go through [`save_json`], which writes
//! to a uniquely named temp file in the target directory and renames it
//! into place. A crash mid-write can never leave a partial manifest for a
//! later stage to consume.

use crate::errors::FolkloreError;
use crate::manifest::{WorkItem, WorkItemKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// An ordered list of work items, serialized as a JSON array.
///
/// Manifests are immutable once written: a stage consumes its input
/// manifest exactly once and writes results to a separate file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    /// The work items, in execution order.
    pub items: Vec<WorkItem>,
}

impl Manifest {
    /// Creates an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a work item, preserving order.
    #[must_use]
    pub fn with_item(mut self, item: WorkItem) -> Self {
        self.items.push(item);
        self
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the manifest has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Loads a manifest from `path`.
    ///
    /// Fails with [`FolkloreError::NotFound`] if the file is missing and
    /// [`FolkloreError::Parse`] if the JSON is malformed.
    pub fn load(path: &Path) -> Result<Self, FolkloreError> {
        load_json(path)
    }

    /// Loads a manifest and validates every item against `expected`.
    ///
    /// Validation failures are reported as [`FolkloreError::Parse`] with
    /// the offending file attached, so bad descriptors surface here rather
    /// than deep inside an executor.
    pub fn load_validated(path: &Path, expected: WorkItemKind) -> Result<Self, FolkloreError> {
        let manifest = Self::load(path)?;
        manifest
            .validate(expected)
            .map_err(|e| FolkloreError::parse(path, e.to_string()))?;
        Ok(manifest)
    }

    /// Validates every item against the expected kind.
    pub fn validate(
        &self,
        expected: WorkItemKind,
    ) -> Result<(), crate::manifest::ItemValidationError> {
        for item in &self.items {
            item.validate(expected)?;
        }
        Ok(())
    }

    /// Saves the manifest to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<(), FolkloreError> {
        save_json(path, self)
    }
}

/// Loads any JSON value from `path`, mapping a missing file to
/// [`FolkloreError::NotFound`] and bad JSON to [`FolkloreError::Parse`].
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, FolkloreError> {
    let bytes = fs::read(path).map_err(|e| FolkloreError::from_io(e, path))?;
    serde_json::from_slice(&bytes).map_err(|e| FolkloreError::parse(path, e.to_string()))
}

/// Saves any JSON value to `path` atomically (temp file + rename).
///
/// Parent directories are created as needed.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), FolkloreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &bytes)
}

/// Saves a JSON value only if its serialized form differs from what is
/// already on disk.
///
/// Returns true if the file was written. Leaving an unchanged file
/// untouched preserves its mtime, so freshness-based stage skipping keeps
/// working across runs.
pub fn save_json_if_changed<T: Serialize>(path: &Path, value: &T) -> Result<bool, FolkloreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    if let Ok(existing) = fs::read(path) {
        if existing == bytes {
            return Ok(false);
        }
    }
    write_atomic(path, &bytes)?;
    Ok(true)
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), FolkloreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "manifest".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

    fs::write(&tmp, bytes)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}
