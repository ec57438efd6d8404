//! Scoped deletion of derived artifacts and manifests.

use crate::config::ProjectLayout;
use crate::errors::FolkloreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// A cleanable region of the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanScope {
    /// Interim caches (`data/interim`).
    Cache,
    /// Raw downloads (`data/raw`). Never cleaned implicitly.
    Raw,
    /// Processed datasets (`data/processed`).
    Datasets,
    /// Trained models (`models/trained`).
    Models,
    /// Model outputs such as predictions (`models/output`).
    Predictions,
    /// Workflow result manifests and report artifacts.
    Workflow,
}

impl CleanScope {
    /// Every scope except `Raw`, in cleaning order.
    ///
    /// Raw inputs are only deleted when the caller names the `Raw` scope
    /// explicitly.
    #[must_use]
    pub fn all_derived() -> [Self; 5] {
        [
            Self::Cache,
            Self::Datasets,
            Self::Models,
            Self::Predictions,
            Self::Workflow,
        ]
    }
}

impl fmt::Display for CleanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Raw => write!(f, "raw"),
            Self::Datasets => write!(f, "datasets"),
            Self::Models => write!(f, "models"),
            Self::Predictions => write!(f, "predictions"),
            Self::Workflow => write!(f, "workflow"),
        }
    }
}

impl FromStr for CleanScope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cache" => Ok(Self::Cache),
            "raw" => Ok(Self::Raw),
            "datasets" => Ok(Self::Datasets),
            "models" => Ok(Self::Models),
            "predictions" => Ok(Self::Predictions),
            "workflow" => Ok(Self::Workflow),
            _ => Err(ParseScopeError {
                input: s.to_string(),
            }),
        }
    }
}

/// Error raised when parsing an unknown scope name.
#[derive(Debug, Clone, Error)]
#[error("unknown clean scope '{input}' (expected cache, raw, datasets, models, predictions or workflow)")]
pub struct ParseScopeError {
    /// The rejected input.
    pub input: String,
}

/// Summary of a clean operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanReport {
    /// Number of files and directories removed.
    pub removed: usize,
}

/// Deletes derived artifacts per scope.
///
/// Cleaning is idempotent: an already-clean or absent scope directory is
/// a no-op, never an error, and scope directories themselves are left in
/// place.
#[derive(Debug, Clone)]
pub struct Cleaner {
    layout: ProjectLayout,
}

impl Cleaner {
    /// Creates a cleaner for the given layout.
    #[must_use]
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    /// The directories belonging to a scope.
    #[must_use]
    pub fn scope_dirs(&self, scope: CleanScope) -> Vec<PathBuf> {
        match scope {
            CleanScope::Cache => vec![self.layout.interim_dir()],
            CleanScope::Raw => vec![self.layout.raw_dir()],
            CleanScope::Datasets => vec![self.layout.processed_dir()],
            CleanScope::Models => vec![self.layout.trained_models_dir()],
            CleanScope::Predictions => vec![self.layout.model_output_dir()],
            CleanScope::Workflow => vec![
                self.layout.workflow_path(),
                self.layout.figures_dir(),
                self.layout.tables_dir(),
                self.layout.summary_dir(),
            ],
        }
    }

    /// Removes the contents of the scope's directories.
    pub fn clean(&self, scope: CleanScope) -> Result<CleanReport, FolkloreError> {
        let mut report = CleanReport::default();
        for dir in self.scope_dirs(scope) {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            for entry in entries {
                let entry = entry?;
                let path = entry.path();
                debug!(scope = %scope, path = %path.display(), "removing");
                if entry.file_type()?.is_dir() {
                    fs::remove_dir_all(&path)?;
                } else {
                    fs::remove_file(&path)?;
                }
                report.removed += 1;
            }
        }
        info!(scope = %scope, removed = report.removed, "clean complete");
        Ok(report)
    }

    /// Cleans every derived scope, leaving raw inputs untouched.
    pub fn clean_derived(&self) -> Result<CleanReport, FolkloreError> {
        let mut report = CleanReport::default();
        for scope in CleanScope::all_derived() {
            report.removed += self.clean(scope)?.removed;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_with_files() -> (tempfile::TempDir, ProjectLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        for sub in [
            layout.raw_dir(),
            layout.interim_dir(),
            layout.processed_dir(),
            layout.trained_models_dir(),
            layout.model_output_dir(),
            layout.workflow_path(),
        ] {
            fs::create_dir_all(&sub).unwrap();
            fs::write(sub.join("artifact.json"), b"{}").unwrap();
        }
        (dir, layout)
    }

    #[test]
    fn test_scope_parse_and_display() {
        for scope in [
            CleanScope::Cache,
            CleanScope::Raw,
            CleanScope::Datasets,
            CleanScope::Models,
            CleanScope::Predictions,
            CleanScope::Workflow,
        ] {
            assert_eq!(scope.to_string().parse::<CleanScope>().unwrap(), scope);
        }
        assert!("everything".parse::<CleanScope>().is_err());
    }

    #[test]
    fn test_clean_removes_only_its_scope() {
        let (_dir, layout) = layout_with_files();
        let cleaner = Cleaner::new(layout.clone());

        let report = cleaner.clean(CleanScope::Models).unwrap();
        assert_eq!(report.removed, 1);

        assert!(!layout.trained_models_dir().join("artifact.json").exists());
        assert!(layout.trained_models_dir().exists());
        assert!(layout.raw_dir().join("artifact.json").exists());
        assert!(layout.processed_dir().join("artifact.json").exists());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let (_dir, layout) = layout_with_files();
        let cleaner = Cleaner::new(layout);

        assert_eq!(cleaner.clean(CleanScope::Cache).unwrap().removed, 1);
        assert_eq!(cleaner.clean(CleanScope::Cache).unwrap().removed, 0);
    }

    #[test]
    fn test_clean_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let cleaner = Cleaner::new(ProjectLayout::new(dir.path()));
        let report = cleaner.clean(CleanScope::Predictions).unwrap();
        assert_eq!(report.removed, 0);
    }

    #[test]
    fn test_clean_empty_raw_leaves_directory() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        fs::create_dir_all(layout.raw_dir()).unwrap();

        let cleaner = Cleaner::new(layout.clone());
        let report = cleaner.clean(CleanScope::Raw).unwrap();

        assert_eq!(report.removed, 0);
        assert!(layout.raw_dir().exists());
    }

    #[test]
    fn test_clean_derived_spares_raw() {
        let (_dir, layout) = layout_with_files();
        let cleaner = Cleaner::new(layout.clone());

        let report = cleaner.clean_derived().unwrap();
        assert_eq!(report.removed, 5);
        assert!(layout.raw_dir().join("artifact.json").exists());
    }

    #[test]
    fn test_clean_removes_nested_dirs() {
        let (_dir, layout) = layout_with_files();
        let nested = layout.interim_dir().join("houses");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("part.csv"), b"x").unwrap();

        let cleaner = Cleaner::new(layout.clone());
        // artifact.json plus the houses/ directory
        assert_eq!(cleaner.clean(CleanScope::Cache).unwrap().removed, 2);
        assert!(layout.interim_dir().exists());
    }
}
