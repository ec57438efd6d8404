//! The stage runner.

use crate::errors::FolkloreError;
use crate::events::{EventSink, NoOpEventSink};
use crate::manifest::Manifest;
use crate::stage::{Executor, ResultManifest, ResultRecord};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs every item of a manifest through an executor.
///
/// Items run strictly in manifest order. A failure in one item is caught
/// and recorded as a failed [`ResultRecord`]; the batch always continues,
/// and the result manifest is written to disk even when items failed.
#[derive(Clone)]
pub struct StageRunner {
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for StageRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRunner").finish_non_exhaustive()
    }
}

impl Default for StageRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl StageRunner {
    /// Creates a runner with no event sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Creates a runner emitting to the given sink.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Runs `manifest` through `executor` and persists the result manifest
    /// at `output_path`.
    ///
    /// Returns the in-memory result manifest; per-item failures do not
    /// make this an error. Only IO/serialization problems while writing
    /// the result manifest abort the run.
    pub async fn run(
        &self,
        stage: &str,
        manifest: &Manifest,
        executor: &dyn Executor,
        output_path: &Path,
    ) -> Result<ResultManifest, FolkloreError> {
        self.sink
            .emit(
                "stage.started",
                Some(serde_json::json!({ "stage": stage, "items": manifest.len() })),
            )
            .await;

        let mut result = ResultManifest::new(stage);

        for item in &manifest.items {
            let started_at = Utc::now();
            self.sink
                .emit(
                    "item.started",
                    Some(serde_json::json!({ "stage": stage, "item": item.name })),
                )
                .await;

            match executor.execute(item).await {
                Ok(output) => {
                    debug!(stage, item = %item.name, artifacts = output.artifacts.len(), "item succeeded");
                    self.sink
                        .emit(
                            "item.completed",
                            Some(serde_json::json!({ "stage": stage, "item": item.name })),
                        )
                        .await;
                    result.push(ResultRecord::success(&item.name, started_at, output.artifacts));
                }
                Err(err) => {
                    warn!(stage, item = %item.name, error = %err.message, "item failed");
                    self.sink
                        .emit(
                            "item.failed",
                            Some(serde_json::json!({
                                "stage": stage,
                                "item": item.name,
                                "error": err.message,
                            })),
                        )
                        .await;
                    result.push(ResultRecord::failed(&item.name, started_at, err.message));
                }
            }
        }

        // Persist before reporting; a later stage consumes this file.
        result.save(output_path)?;

        info!(
            stage,
            succeeded = result.succeeded(),
            failed = result.failed(),
            "stage complete"
        );
        self.sink
            .emit(
                "stage.completed",
                Some(serde_json::json!({
                    "stage": stage,
                    "succeeded": result.succeeded(),
                    "failed": result.failed(),
                })),
            )
            .await;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WorkItemError;
    use crate::events::CollectingEventSink;
    use crate::manifest::WorkItem;
    use crate::stage::{FnExecutor, ItemOutput, NoOpExecutor};

    fn two_item_manifest() -> Manifest {
        Manifest::new()
            .with_item(WorkItem::new("scale_a"))
            .with_item(WorkItem::new("bad_step"))
    }

    fn flaky_executor() -> impl Executor {
        FnExecutor::new("flaky", |item: &WorkItem| {
            if item.name == "bad_step" {
                Err(WorkItemError::new(&item.name, "executor raised"))
            } else {
                Ok(ItemOutput::artifact(format!("data/processed/{}.json", item.name)))
            }
        })
    }

    #[tokio::test]
    async fn test_one_record_per_item_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("transformer_list.json.result");

        let result = StageRunner::new()
            .run("transform", &two_item_manifest(), &flaky_executor(), &out)
            .await
            .unwrap();

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].name, "scale_a");
        assert!(result.records[0].is_success());
        assert_eq!(result.records[1].name, "bad_step");
        assert!(result.records[1].is_failure());
    }

    #[tokio::test]
    async fn test_result_written_despite_failures() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("result.json");

        StageRunner::new()
            .run("transform", &two_item_manifest(), &flaky_executor(), &out)
            .await
            .unwrap();

        let loaded = ResultManifest::load(&out).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.succeeded(), 1);
        assert_eq!(loaded.failed(), 1);
    }

    #[tokio::test]
    async fn test_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("result.json");

        let result = StageRunner::new()
            .run("train", &Manifest::new(), &NoOpExecutor, &out)
            .await
            .unwrap();

        assert!(result.records.is_empty());
        assert!(result.is_all_success());
        assert!(out.exists());
    }

    #[tokio::test]
    async fn test_events_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("result.json");
        let sink = Arc::new(CollectingEventSink::new());

        StageRunner::with_sink(sink.clone())
            .run("transform", &two_item_manifest(), &flaky_executor(), &out)
            .await
            .unwrap();

        assert_eq!(sink.events_of_type("stage.started").len(), 1);
        assert_eq!(sink.events_of_type("item.started").len(), 2);
        assert_eq!(sink.events_of_type("item.completed").len(), 1);
        assert_eq!(sink.events_of_type("item.failed").len(), 1);
        assert_eq!(sink.events_of_type("stage.completed").len(), 1);
    }

    #[tokio::test]
    async fn test_deterministic_reruns_match() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("result.json");
        let runner = StageRunner::new();
        let manifest = two_item_manifest();

        let first = runner
            .run("transform", &manifest, &flaky_executor(), &out)
            .await
            .unwrap();
        let second = runner
            .run("transform", &manifest, &flaky_executor(), &out)
            .await
            .unwrap();

        let summarize = |r: &ResultManifest| {
            r.records
                .iter()
                .map(|rec| (rec.name.clone(), rec.status, rec.artifacts.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(summarize(&first), summarize(&second));
    }
}
