//! Work item descriptors.
//!
//! Work items are dynamic JSON on disk; they are modeled as a struct with
//! a tagged kind and validated when a manifest is loaded, so bad
//! descriptors are rejected before any executor runs.

use crate::utils::validate_name;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The known kinds of work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    /// A data transformation applied to a processed dataset.
    Transform,
    /// A model training run.
    Train,
    /// A prediction run over a trained model.
    Predict,
    /// An analysis producing report artifacts.
    Analyze,
}

impl WorkItemKind {
    /// Returns true if items of this kind must reference an upstream
    /// artifact via `source`.
    ///
    /// Training needs the dataset to train on; prediction needs the model
    /// to load.
    #[must_use]
    pub fn requires_source(self) -> bool {
        matches!(self, Self::Train | Self::Predict)
    }
}

impl fmt::Display for WorkItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform => write!(f, "transform"),
            Self::Train => write!(f, "train"),
            Self::Predict => write!(f, "predict"),
            Self::Analyze => write!(f, "analyze"),
        }
    }
}

/// One named task within a manifest.
///
/// The `kind` tag is optional on the wire: manifests in the wild are bare
/// lists like `[{"name": "scale_a"}]`, and the consuming stage supplies
/// the expected kind at validation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// The item name; unique within a manifest by convention.
    pub name: String,

    /// The declared kind, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<WorkItemKind>,

    /// Reference to an upstream artifact or dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Free-form configuration parameters for the executor.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl WorkItem {
    /// Creates a new work item with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            source: None,
            params: serde_json::Map::new(),
        }
    }

    /// Sets the declared kind.
    #[must_use]
    pub fn with_kind(mut self, kind: WorkItemKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the upstream source reference.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a configuration parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Looks up a configuration parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }

    /// Validates the item against the kind the consuming stage expects.
    pub fn validate(&self, expected: WorkItemKind) -> Result<(), ItemValidationError> {
        validate_name(&self.name).map_err(|e| ItemValidationError {
            item: self.name.clone(),
            reason: e.to_string(),
        })?;

        if let Some(declared) = self.kind {
            if declared != expected {
                return Err(ItemValidationError {
                    item: self.name.clone(),
                    reason: format!("declares kind '{declared}' but the stage expects '{expected}'"),
                });
            }
        }

        if expected.requires_source() && self.source.is_none() {
            return Err(ItemValidationError {
                item: self.name.clone(),
                reason: format!("items of kind '{expected}' require a 'source'"),
            });
        }

        Ok(())
    }
}

/// Error raised when a work item fails validation.
#[derive(Debug, Clone, Error)]
#[error("work item '{item}': {reason}")]
pub struct ItemValidationError {
    /// The offending item name (possibly empty).
    pub item: String,
    /// Why the item was rejected.
    pub reason: String,
}
