//! Result records and result manifests.

use crate::errors::FolkloreError;
use crate::manifest::{load_json, save_json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The outcome of executing one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// The item completed and its artifacts were produced.
    Success,
    /// The item failed; the error is recorded alongside.
    Failed,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of running one work item, collected into a result manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// The work item name.
    pub name: String,
    /// Success or failure.
    pub status: ItemStatus,
    /// Artifact paths produced by the item.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<PathBuf>,
    /// Error message if the item failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When execution of the item started.
    pub started_at: DateTime<Utc>,
    /// When execution of the item ended.
    pub ended_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Creates a success record.
    #[must_use]
    pub fn success(
        name: impl Into<String>,
        started_at: DateTime<Utc>,
        artifacts: Vec<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            status: ItemStatus::Success,
            artifacts,
            error: None,
            started_at,
            ended_at: Utc::now(),
        }
    }

    /// Creates a failure record.
    #[must_use]
    pub fn failed(
        name: impl Into<String>,
        started_at: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: ItemStatus::Failed,
            artifacts: Vec::new(),
            error: Some(error.into()),
            started_at,
            ended_at: Utc::now(),
        }
    }

    /// Returns the execution duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Returns true if the item succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, ItemStatus::Success)
    }

    /// Returns true if the item failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ItemStatus::Failed)
    }
}

/// The persisted outcome of one stage run.
///
/// Holds exactly one record per input work item, in input order; a partial
/// failure shows up as a failed record, never a missing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultManifest {
    /// The stage that produced these results.
    pub stage: String,
    /// One record per input item, in input order.
    #[serde(default)]
    pub records: Vec<ResultRecord>,
    /// When the result manifest was created.
    pub created_at: DateTime<Utc>,
}

impl ResultManifest {
    /// Creates an empty result manifest for a stage.
    #[must_use]
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            records: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Appends a record, preserving order.
    pub fn push(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    /// Returns the number of succeeded items.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    /// Returns the number of failed items.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.is_failure()).count()
    }

    /// Returns true if every item succeeded.
    #[must_use]
    pub fn is_all_success(&self) -> bool {
        self.failed() == 0
    }

    /// Saves the result manifest atomically.
    pub fn save(&self, path: &Path) -> Result<(), FolkloreError> {
        save_json(path, self)
    }

    /// Loads a result manifest.
    pub fn load(path: &Path) -> Result<Self, FolkloreError> {
        load_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&ItemStatus::Success).unwrap(), r#""success""#);
        assert_eq!(serde_json::to_string(&ItemStatus::Failed).unwrap(), r#""failed""#);
    }

    #[test]
    fn test_success_record() {
        let record = ResultRecord::success(
            "scale_a",
            Utc::now(),
            vec![PathBuf::from("data/processed/scale_a.json")],
        );
        assert!(record.is_success());
        assert!(record.error.is_none());
        assert_eq!(record.artifacts.len(), 1);
    }

    #[test]
    fn test_failed_record() {
        let record = ResultRecord::failed("bad_step", Utc::now(), "executor raised");
        assert!(record.is_failure());
        assert_eq!(record.error.as_deref(), Some("executor raised"));
        assert!(record.artifacts.is_empty());
    }

    #[test]
    fn test_duration_is_non_negative() {
        let record = ResultRecord::success("x", Utc::now(), Vec::new());
        assert!(record.duration_ms() >= 0.0);
    }

    #[test]
    fn test_counts() {
        let mut result = ResultManifest::new("transform");
        result.push(ResultRecord::success("a", Utc::now(), Vec::new()));
        result.push(ResultRecord::failed("b", Utc::now(), "boom"));
        result.push(ResultRecord::success("c", Utc::now(), Vec::new()));

        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed(), 1);
        assert!(!result.is_all_success());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trained_models.json");

        let mut result = ResultManifest::new("train");
        result.push(ResultRecord::success("linreg", Utc::now(), Vec::new()));
        result.save(&path).unwrap();

        let loaded = ResultManifest::load(&path).unwrap();
        assert_eq!(result, loaded);
    }
}
