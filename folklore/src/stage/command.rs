//! An executor that delegates work items to an external command.
//!
//! The domain logic of a stage (what a transform or training step
//! actually computes) lives outside folklore. `CommandExecutor` bridges
//! to it: each item is handed to a subprocess as JSON, and every
//! non-empty line the command prints to stdout is collected as an
//! artifact path.

use crate::errors::WorkItemError;
use crate::manifest::WorkItem;
use crate::stage::{Executor, ItemOutput};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Runs a configured command once per work item.
///
/// The command is resolved per item: an item may carry its own `command`
/// parameter (a whitespace-separated program line), falling back to the
/// executor's default. An item with neither fails and is recorded as such
/// by the stage runner.
///
/// The serialized item is appended as the final argument.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    default: Option<Vec<String>>,
}

impl CommandExecutor {
    /// Creates an executor with no default command; every item must carry
    /// its own `command` parameter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor from a whitespace-separated command line, e.g.
    /// `"python scripts/train.py"`.
    #[must_use]
    pub fn from_template(template: &str) -> Self {
        let parts: Vec<String> = template.split_whitespace().map(str::to_string).collect();
        Self {
            default: if parts.is_empty() { None } else { Some(parts) },
        }
    }

    fn resolve(&self, item: &WorkItem) -> Result<Vec<String>, WorkItemError> {
        if let Some(value) = item.param("command") {
            let line = value.as_str().ok_or_else(|| {
                WorkItemError::new(&item.name, "'command' parameter must be a string")
            })?;
            let parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if parts.is_empty() {
                return Err(WorkItemError::new(&item.name, "'command' parameter is empty"));
            }
            return Ok(parts);
        }

        self.default
            .clone()
            .ok_or_else(|| WorkItemError::new(&item.name, "no command configured for this item"))
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    async fn execute(&self, item: &WorkItem) -> Result<ItemOutput, WorkItemError> {
        let parts = self.resolve(item)?;
        let payload = serde_json::to_string(item)
            .map_err(|e| WorkItemError::new(&item.name, format!("serialize item: {e}")))?;

        debug!(item = %item.name, command = %parts.join(" "), "spawning item command");

        let output = Command::new(&parts[0])
            .args(&parts[1..])
            .arg(&payload)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                WorkItemError::new(&item.name, format!("failed to spawn '{}': {e}", parts[0]))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("; ");
            return Err(WorkItemError::new(
                &item.name,
                format!("command exited with {}: {tail}", output.status),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut result = ItemOutput::empty();
        for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            result = result.with_artifact(line);
        }
        Ok(result)
    }
}
