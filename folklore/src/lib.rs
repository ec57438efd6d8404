//! # Folklore
//!
//! The pipeline-orchestration and artifact-tracking core of a data-science
//! workflow tool.
//!
//! Folklore sequences workflow stages
//! (fetch → unpack → process → transform → train → predict → analyze),
//! where each stage:
//!
//! - **Consumes a manifest**: an ordered JSON list of work items
//! - **Runs an executor per item**: failures are recorded, not fatal
//! - **Writes a result manifest**: one record per item, in order
//! - **Produces artifacts**: files under convention paths that can be
//!   cleaned per scope for idempotent re-runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use folklore::prelude::*;
//!
//! let layout = ProjectLayout::new("/srv/project");
//! let manifest = Manifest::load(&layout.workflow_dir().join("model_list.json"))?;
//!
//! let runner = StageRunner::new();
//! let result = runner
//!     .run("train", &manifest, &executor, &layout.workflow_dir().join("trained_models.json"))
//!     .await?;
//!
//! println!("{} trained, {} failed", result.succeeded(), result.failed());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod catalog;
pub mod config;
pub mod errors;
pub mod events;
pub mod manifest;
pub mod pipeline;
pub mod stage;
pub mod utils;
pub mod workspace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::catalog::{Catalog, RawDataset, SourceFile};
    pub use crate::config::ProjectLayout;
    pub use crate::errors::{FolkloreError, WorkItemError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::manifest::{Manifest, WorkItem, WorkItemKind};
    pub use crate::pipeline::{Pipeline, PipelineReport, StageOutcome, StageSpec};
    pub use crate::stage::{
        CommandExecutor, Executor, ItemOutput, ItemStatus, ResultManifest,
        ResultRecord, StageRunner,
    };
    pub use crate::utils::{iso_timestamp, now_utc};
    pub use crate::workspace::{CleanReport, CleanScope, Cleaner};
}
