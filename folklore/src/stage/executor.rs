//! Executor trait and basic implementations.
//!
//! Executors carry the domain-specific work (training a model, applying a
//! transform); folklore only sequences them and records their outcomes.

use crate::errors::WorkItemError;
use crate::manifest::WorkItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::PathBuf;

/// Output of a single work item execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemOutput {
    /// Paths of artifacts produced by the item.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<PathBuf>,

    /// Optional structured data reported by the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ItemOutput {
    /// Creates an output with no artifacts.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates an output with a single artifact path.
    #[must_use]
    pub fn artifact(path: impl Into<PathBuf>) -> Self {
        Self {
            artifacts: vec![path.into()],
            data: None,
        }
    }

    /// Adds an artifact path.
    #[must_use]
    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifacts.push(path.into());
        self
    }

    /// Sets the structured data payload.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Trait for stage-specific work item executors.
///
/// An executor failure is an ordinary outcome: the stage runner records it
/// and continues with the next item.
#[async_trait]
pub trait Executor: Send + Sync + Debug {
    /// Executes one work item.
    async fn execute(&self, item: &WorkItem) -> Result<ItemOutput, WorkItemError>;
}

/// A closure-backed executor, for tests and embedding.
pub struct FnExecutor<F>
where
    F: Fn(&WorkItem) -> Result<ItemOutput, WorkItemError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(&WorkItem) -> Result<ItemOutput, WorkItemError> + Send + Sync,
{
    /// Creates a new closure-backed executor.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnExecutor<F>
where
    F: Fn(&WorkItem) -> Result<ItemOutput, WorkItemError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnExecutor").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Executor for FnExecutor<F>
where
    F: Fn(&WorkItem) -> Result<ItemOutput, WorkItemError> + Send + Sync,
{
    async fn execute(&self, item: &WorkItem) -> Result<ItemOutput, WorkItemError> {
        (self.func)(item)
    }
}

/// An executor that succeeds with empty output, for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpExecutor;

#[async_trait]
impl Executor for NoOpExecutor {
    async fn execute(&self, _item: &WorkItem) -> Result<ItemOutput, WorkItemError> {
        Ok(ItemOutput::empty())
    }
}
