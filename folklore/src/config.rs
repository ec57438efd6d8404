//! Project layout configuration.
//!
//! Every manifest and artifact path is named explicitly by a
//! [`ProjectLayout`] passed into components, rather than assumed as an
//! ambient global. Serialized layouts let a project pin nonstandard
//! directory names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Named directories of a folklore project, relative to a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLayout {
    /// The project root; all other paths are resolved beneath it.
    pub root: PathBuf,
    /// Data directory name (holds `raw`, `interim`, `processed`).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Models directory name (holds `trained`, `output`).
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
    /// Reports directory name (holds `figures`, `tables`, `summary`).
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
    /// Workflow directory name (manifests and result manifests).
    #[serde(default = "default_workflow_dir")]
    pub workflow_dir: PathBuf,
    /// Catalog directory name (raw dataset descriptors).
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_workflow_dir() -> PathBuf {
    PathBuf::from("workflow")
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from("catalog")
}

impl ProjectLayout {
    /// Creates a layout rooted at `root` with conventional directory names.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            data_dir: default_data_dir(),
            models_dir: default_models_dir(),
            reports_dir: default_reports_dir(),
            workflow_dir: default_workflow_dir(),
            catalog_dir: default_catalog_dir(),
        }
    }

    /// Overrides the data directory name.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Overrides the workflow directory name.
    #[must_use]
    pub fn with_workflow_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workflow_dir = dir.into();
        self
    }

    /// Raw downloads: `<root>/data/raw`.
    #[must_use]
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(&self.data_dir).join("raw")
    }

    /// Unpacked and cached intermediates: `<root>/data/interim`.
    #[must_use]
    pub fn interim_dir(&self) -> PathBuf {
        self.root.join(&self.data_dir).join("interim")
    }

    /// Processed datasets: `<root>/data/processed`.
    #[must_use]
    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(&self.data_dir).join("processed")
    }

    /// Trained model artifacts: `<root>/models/trained`.
    #[must_use]
    pub fn trained_models_dir(&self) -> PathBuf {
        self.root.join(&self.models_dir).join("trained")
    }

    /// Model outputs such as predictions: `<root>/models/output`.
    #[must_use]
    pub fn model_output_dir(&self) -> PathBuf {
        self.root.join(&self.models_dir).join("output")
    }

    /// Report figures: `<root>/reports/figures`.
    #[must_use]
    pub fn figures_dir(&self) -> PathBuf {
        self.root.join(&self.reports_dir).join("figures")
    }

    /// Report tables: `<root>/reports/tables`.
    #[must_use]
    pub fn tables_dir(&self) -> PathBuf {
        self.root.join(&self.reports_dir).join("tables")
    }

    /// Report summaries: `<root>/reports/summary`.
    #[must_use]
    pub fn summary_dir(&self) -> PathBuf {
        self.root.join(&self.reports_dir).join("summary")
    }

    /// Workflow manifests and result manifests: `<root>/workflow`.
    #[must_use]
    pub fn workflow_path(&self) -> PathBuf {
        self.root.join(&self.workflow_dir)
    }

    /// The raw dataset catalog file: `<root>/catalog/raw_datasets.json`.
    #[must_use]
    pub fn catalog_file(&self) -> PathBuf {
        self.root.join(&self.catalog_dir).join("raw_datasets.json")
    }

    /// Convention path for a workflow manifest by file name.
    #[must_use]
    pub fn workflow_file(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.workflow_path().join(file_name.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_paths() {
        let layout = ProjectLayout::new("/srv/project");
        assert_eq!(layout.raw_dir(), PathBuf::from("/srv/project/data/raw"));
        assert_eq!(
            layout.processed_dir(),
            PathBuf::from("/srv/project/data/processed")
        );
        assert_eq!(
            layout.trained_models_dir(),
            PathBuf::from("/srv/project/models/trained")
        );
        assert_eq!(
            layout.catalog_file(),
            PathBuf::from("/srv/project/catalog/raw_datasets.json")
        );
    }

    #[test]
    fn test_with_overrides() {
        let layout = ProjectLayout::new("/p")
            .with_data_dir("datasets")
            .with_workflow_dir("wf");
        assert_eq!(layout.raw_dir(), PathBuf::from("/p/datasets/raw"));
        assert_eq!(layout.workflow_path(), PathBuf::from("/p/wf"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let layout: ProjectLayout = serde_json::from_str(r#"{"root": "/p"}"#).unwrap();
        assert_eq!(layout, ProjectLayout::new("/p"));
    }

    #[test]
    fn test_workflow_file() {
        let layout = ProjectLayout::new("/p");
        assert_eq!(
            layout.workflow_file("model_list.json"),
            PathBuf::from("/p/workflow/model_list.json")
        );
    }
}
