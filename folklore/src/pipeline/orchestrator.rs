//! The pipeline orchestrator.

use crate::errors::FolkloreError;
use crate::events::{EventSink, NoOpEventSink};
use crate::manifest::Manifest;
use crate::pipeline::StageSpec;
use crate::stage::StageRunner;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// The outcome of one stage within a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage ran; counts come from its result manifest.
    Ran {
        /// Number of items that succeeded.
        succeeded: usize,
        /// Number of items that failed.
        failed: usize,
    },
    /// The stage was skipped.
    Skipped {
        /// Why the stage was skipped.
        reason: String,
    },
}

/// Per-stage entry of a [`PipelineReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    /// The stage name.
    pub stage: String,
    /// What happened to the stage.
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

/// Summary of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Per-stage outcomes, in execution order.
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Returns the total number of failed items across all stages.
    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.stages
            .iter()
            .map(|s| match s.outcome {
                StageOutcome::Ran { failed, .. } => failed,
                StageOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    /// Returns the number of stages that were skipped as up to date.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| matches!(s.outcome, StageOutcome::Skipped { .. }))
            .count()
    }
}

/// Returns true when `output` exists and is strictly newer than `input`.
///
/// This mirrors file-timestamp dependency semantics: equal mtimes count
/// as stale, so coarse-grained filesystems re-run rather than skip.
#[must_use]
pub fn is_up_to_date(input: &Path, output: &Path) -> bool {
    let (Ok(input_meta), Ok(output_meta)) = (fs::metadata(input), fs::metadata(output)) else {
        return false;
    };
    match (input_meta.modified(), output_meta.modified()) {
        (Ok(input_mtime), Ok(output_mtime)) => output_mtime > input_mtime,
        _ => false,
    }
}

/// Runs stages strictly in order, skipping stages whose output manifest
/// is already newer than their input manifest.
#[derive(Clone)]
pub struct Pipeline {
    runner: StageRunner,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Creates a pipeline with no event sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runner: StageRunner::new(),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Creates a pipeline emitting to the given sink.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            runner: StageRunner::with_sink(sink.clone()),
            sink,
        }
    }

    /// Runs the given stages in order.
    ///
    /// Fails with [`FolkloreError::StageDependency`] when a stage's input
    /// manifest is absent, and with [`FolkloreError::Parse`] when a
    /// manifest fails validation. Per-item failures never abort the run.
    pub async fn run(&self, stages: &[StageSpec]) -> Result<PipelineReport, FolkloreError> {
        let run_id = Uuid::now_v7();
        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(stages.len());

        info!(%run_id, stages = stages.len(), "pipeline started");

        for spec in stages {
            spec.validate()?;

            if !spec.input_manifest.exists() {
                return Err(FolkloreError::stage_dependency(
                    &spec.name,
                    &spec.input_manifest,
                ));
            }

            if is_up_to_date(&spec.input_manifest, &spec.output_manifest) {
                info!(stage = %spec.name, "output up to date, skipping");
                self.sink
                    .emit(
                        "stage.skipped",
                        Some(serde_json::json!({ "stage": spec.name })),
                    )
                    .await;
                reports.push(StageReport {
                    stage: spec.name.clone(),
                    outcome: StageOutcome::Skipped {
                        reason: "output newer than input".to_string(),
                    },
                });
                continue;
            }

            let manifest = Manifest::load_validated(&spec.input_manifest, spec.kind)?;
            let result = self
                .runner
                .run(
                    &spec.name,
                    &manifest,
                    spec.executor.as_ref(),
                    &spec.output_manifest,
                )
                .await?;

            reports.push(StageReport {
                stage: spec.name.clone(),
                outcome: StageOutcome::Ran {
                    succeeded: result.succeeded(),
                    failed: result.failed(),
                },
            });
        }

        let report = PipelineReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            stages: reports,
        };

        info!(
            %run_id,
            failed_items = report.total_failed(),
            skipped_stages = report.skipped(),
            "pipeline finished"
        );

        Ok(report)
    }
}
