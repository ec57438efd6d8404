//! Stage specifications.

use crate::errors::FolkloreError;
use crate::manifest::WorkItemKind;
use crate::stage::Executor;
use crate::utils::validate_name;
use std::path::PathBuf;
use std::sync::Arc;

/// Specification for a single stage in a pipeline.
///
/// A stage consumes `input_manifest`, runs each item through `executor`,
/// and writes its result manifest to `output_manifest`.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// The unique name of the stage.
    pub name: String,
    /// The kind of work item this stage expects.
    pub kind: WorkItemKind,
    /// Path of the manifest the stage consumes.
    pub input_manifest: PathBuf,
    /// Path where the result manifest is written.
    pub output_manifest: PathBuf,
    /// The executor invoked once per work item.
    pub executor: Arc<dyn Executor>,
}

impl StageSpec {
    /// Creates a new stage specification.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: WorkItemKind,
        input_manifest: impl Into<PathBuf>,
        output_manifest: impl Into<PathBuf>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            input_manifest: input_manifest.into(),
            output_manifest: output_manifest.into(),
            executor,
        }
    }

    /// Validates the stage specification.
    pub fn validate(&self) -> Result<(), FolkloreError> {
        validate_name(&self.name)
            .map_err(|e| FolkloreError::parse(&self.input_manifest, e.to_string()))?;
        if self.input_manifest == self.output_manifest {
            return Err(FolkloreError::parse(
                &self.input_manifest,
                format!("stage '{}' reads and writes the same manifest", self.name),
            ));
        }
        Ok(())
    }
}
