//! Error types for the folklore workflow core.
//!
//! The taxonomy distinguishes errors that abort a stage (missing or
//! malformed manifests, missing upstream outputs) from per-item failures,
//! which are caught and recorded in the result manifest instead of being
//! raised.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for folklore operations.
#[derive(Debug, Error)]
pub enum FolkloreError {
    /// A required manifest or artifact does not exist.
    #[error("Not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// A manifest exists but could not be parsed or validated.
    #[error("Parse error in {}: {message}", path.display())]
    Parse {
        /// The offending file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// A stage's required input manifest is absent.
    #[error("Stage '{stage}' requires missing input manifest: {}", path.display())]
    StageDependency {
        /// The stage that cannot run.
        stage: String,
        /// The absent input manifest.
        path: PathBuf,
    },

    /// An individual work item failed.
    ///
    /// The stage runner catches this per item and records it; it only
    /// surfaces as an error when an executor is invoked outside a batch.
    #[error("{0}")]
    WorkItem(#[from] WorkItemError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FolkloreError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a parse error for a file.
    #[must_use]
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a stage dependency error.
    #[must_use]
    pub fn stage_dependency(stage: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::StageDependency {
            stage: stage.into(),
            path: path.into(),
        }
    }

    /// Maps an IO error on `path` to `NotFound` when appropriate.
    #[must_use]
    pub fn from_io(err: std::io::Error, path: &Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::not_found(path)
        } else {
            Self::Io(err)
        }
    }
}

/// Failure of a single work item within a stage.
///
/// Serializable so the message can be embedded in a failed
/// [`ResultRecord`](crate::stage::ResultRecord).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Work item '{item}' failed: {message}")]
pub struct WorkItemError {
    /// The name of the failed item.
    pub item: String,
    /// The failure message.
    pub message: String,
}

impl WorkItemError {
    /// Creates a new work item error.
    #[must_use]
    pub fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
        }
    }
}
