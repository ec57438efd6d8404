//! Folklore CLI: runs workflow stages and cleans derived artifacts.
//!
//! Exit codes follow the workflow contract: per-item failures are logged
//! and counted but exit 0; a manifest that cannot be loaded or parsed, or
//! a missing stage dependency, exits nonzero.

use anyhow::Context;
use clap::{Parser, Subcommand};
use folklore::catalog::{Catalog, FetchExecutor, ProcessExecutor, UnpackExecutor};
use folklore::config::ProjectLayout;
use folklore::manifest::{save_json_if_changed, Manifest, WorkItemKind};
use folklore::pipeline::{is_up_to_date, Pipeline, StageSpec};
use folklore::stage::{CommandExecutor, Executor, ResultManifest, StageRunner};
use folklore::workspace::{CleanScope, Cleaner};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folklore")]
#[command(about = "Pipeline orchestration for data-science workflows", long_about = None)]
struct Cli {
    /// Project root containing data/, models/, reports/ and workflow/
    #[arg(long, global = true, default_value = ".")]
    project_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch raw dataset files listed in the catalog
    FetchRaw {
        /// Restrict to these datasets (default: all)
        datasets: Vec<String>,
    },

    /// Materialize fetched files into data/interim
    UnpackRaw {
        /// Restrict to these datasets (default: all)
        datasets: Vec<String>,
    },

    /// Write processed dataset metadata into data/processed
    ProcessRaw {
        /// Restrict to these datasets (default: all)
        datasets: Vec<String>,
    },

    /// Run the transform stage over a manifest
    TransformData {
        /// Path to the manifest JSON file
        manifest: PathBuf,

        /// Default command for items without their own (e.g. "python transform.py")
        #[arg(long)]
        command: Option<String>,
    },

    /// Run the training stage over a manifest, producing trained_models.json
    Train {
        /// Path to the manifest JSON file
        manifest: PathBuf,

        /// Default command for items without their own
        #[arg(long)]
        command: Option<String>,
    },

    /// Run the prediction stage over a manifest, producing predictions.json
    Predict {
        /// Path to the manifest JSON file
        manifest: PathBuf,

        /// Default command for items without their own
        #[arg(long)]
        command: Option<String>,
    },

    /// Run the analysis stage over a manifest, producing analyses.json
    Analysis {
        /// Path to the manifest JSON file
        manifest: PathBuf,

        /// Default command for items without their own
        #[arg(long)]
        command: Option<String>,
    },

    /// Run every stage in order over convention-path manifests
    Run,

    /// Remove all derived artifacts (raw inputs are kept)
    Clean,
    /// Remove interim caches
    CleanCache,
    /// Remove raw downloads
    CleanRaw,
    /// Remove processed datasets
    CleanDatasets,
    /// Remove trained models
    CleanModels,
    /// Remove model outputs
    CleanPredictions,
    /// Remove workflow results and report artifacts
    CleanWorkflow,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let layout = ProjectLayout::new(&cli.project_root);

    match cli.command {
        Commands::FetchRaw { datasets } => {
            let catalog = load_catalog(&layout)?;
            let executor = FetchExecutor::new(layout.clone(), catalog.clone());
            run_catalog_stage(&layout, "fetch", &catalog, &datasets, &executor, "fetched.json")
                .await
        }
        Commands::UnpackRaw { datasets } => {
            let catalog = load_catalog(&layout)?;
            let executor = UnpackExecutor::new(layout.clone(), catalog.clone());
            run_catalog_stage(&layout, "unpack", &catalog, &datasets, &executor, "unpacked.json")
                .await
        }
        Commands::ProcessRaw { datasets } => {
            let catalog = load_catalog(&layout)?;
            let executor = ProcessExecutor::new(layout.clone(), catalog.clone());
            run_catalog_stage(&layout, "process", &catalog, &datasets, &executor, "processed.json")
                .await
        }
        Commands::TransformData { manifest, command } => {
            run_manifest_stage(
                &layout,
                "transform",
                WorkItemKind::Transform,
                &manifest,
                "transformed.json",
                command.as_deref(),
            )
            .await
        }
        Commands::Train { manifest, command } => {
            run_manifest_stage(
                &layout,
                "train",
                WorkItemKind::Train,
                &manifest,
                "trained_models.json",
                command.as_deref(),
            )
            .await
        }
        Commands::Predict { manifest, command } => {
            run_manifest_stage(
                &layout,
                "predict",
                WorkItemKind::Predict,
                &manifest,
                "predictions.json",
                command.as_deref(),
            )
            .await
        }
        Commands::Analysis { manifest, command } => {
            run_manifest_stage(
                &layout,
                "analysis",
                WorkItemKind::Analyze,
                &manifest,
                "analyses.json",
                command.as_deref(),
            )
            .await
        }
        Commands::Run => run_full_pipeline(&layout).await,
        Commands::Clean => {
            let report = Cleaner::new(layout).clean_derived()?;
            println!("removed {} entries", report.removed);
            Ok(())
        }
        Commands::CleanCache => clean_scope(layout, CleanScope::Cache),
        Commands::CleanRaw => clean_scope(layout, CleanScope::Raw),
        Commands::CleanDatasets => clean_scope(layout, CleanScope::Datasets),
        Commands::CleanModels => clean_scope(layout, CleanScope::Models),
        Commands::CleanPredictions => clean_scope(layout, CleanScope::Predictions),
        Commands::CleanWorkflow => clean_scope(layout, CleanScope::Workflow),
    }
}

fn load_catalog(layout: &ProjectLayout) -> anyhow::Result<Catalog> {
    Catalog::load(&layout.catalog_file()).context("loading raw dataset catalog")
}

fn clean_scope(layout: ProjectLayout, scope: CleanScope) -> anyhow::Result<()> {
    let report = Cleaner::new(layout).clean(scope)?;
    println!("removed {} entries from '{scope}'", report.removed);
    Ok(())
}

fn print_summary(result: &ResultManifest) {
    println!(
        "{}: {} succeeded, {} failed",
        result.stage,
        result.succeeded(),
        result.failed()
    );
}

/// Runs one catalog-driven stage (fetch, unpack or process).
async fn run_catalog_stage(
    layout: &ProjectLayout,
    stage: &str,
    catalog: &Catalog,
    datasets: &[String],
    executor: &dyn Executor,
    result_name: &str,
) -> anyhow::Result<()> {
    let manifest = catalog.to_manifest(datasets);
    if manifest.is_empty() {
        info!(stage, "catalog is empty, nothing to do");
    }

    let output = layout.workflow_file(result_name);
    let result = StageRunner::new()
        .run(stage, &manifest, executor, &output)
        .await
        .with_context(|| format!("running the {stage} stage"))?;

    print_summary(&result);
    Ok(())
}

/// Runs one manifest-driven stage. Per-item failures are recorded in the
/// result manifest and do not affect the exit code.
async fn run_manifest_stage(
    layout: &ProjectLayout,
    stage: &str,
    kind: WorkItemKind,
    manifest_path: &PathBuf,
    result_name: &str,
    command: Option<&str>,
) -> anyhow::Result<()> {
    let manifest = Manifest::load_validated(manifest_path, kind)
        .with_context(|| format!("loading manifest for the {stage} stage"))?;

    let executor = command.map_or_else(CommandExecutor::new, CommandExecutor::from_template);
    let output = layout.workflow_file(result_name);

    let result = StageRunner::new()
        .run(stage, &manifest, &executor, &output)
        .await
        .with_context(|| format!("running the {stage} stage"))?;

    print_summary(&result);
    Ok(())
}

/// Runs the whole workflow in order: catalog stages first, then the four
/// manifest stages through the orchestrator with freshness-based skipping.
async fn run_full_pipeline(layout: &ProjectLayout) -> anyhow::Result<()> {
    let catalog = load_catalog(layout)?;
    let runner = StageRunner::new();

    // Materialize the catalog as a manifest; an unchanged file keeps its
    // mtime so freshness skipping works across runs.
    let list_path = layout.workflow_file("raw_datasets_list.json");
    save_json_if_changed(&list_path, &catalog.to_manifest(&[]))?;

    let catalog_stages: [(&str, Arc<dyn Executor>, &str); 3] = [
        (
            "fetch",
            Arc::new(FetchExecutor::new(layout.clone(), catalog.clone())),
            "fetched.json",
        ),
        (
            "unpack",
            Arc::new(UnpackExecutor::new(layout.clone(), catalog.clone())),
            "unpacked.json",
        ),
        (
            "process",
            Arc::new(ProcessExecutor::new(layout.clone(), catalog.clone())),
            "processed.json",
        ),
    ];

    for (stage, executor, result_name) in catalog_stages {
        let output = layout.workflow_file(result_name);
        if is_up_to_date(&list_path, &output) {
            info!(stage, "output up to date, skipping");
            continue;
        }
        let manifest = Manifest::load(&list_path)?;
        let result = runner
            .run(stage, &manifest, executor.as_ref(), &output)
            .await
            .with_context(|| format!("running the {stage} stage"))?;
        print_summary(&result);
    }

    let stages = vec![
        StageSpec::new(
            "transform",
            WorkItemKind::Transform,
            layout.workflow_file("transformer_list.json"),
            layout.workflow_file("transformed.json"),
            Arc::new(CommandExecutor::new()),
        ),
        StageSpec::new(
            "train",
            WorkItemKind::Train,
            layout.workflow_file("model_list.json"),
            layout.workflow_file("trained_models.json"),
            Arc::new(CommandExecutor::new()),
        ),
        StageSpec::new(
            "predict",
            WorkItemKind::Predict,
            layout.workflow_file("predict_list.json"),
            layout.workflow_file("predictions.json"),
            Arc::new(CommandExecutor::new()),
        ),
        StageSpec::new(
            "analysis",
            WorkItemKind::Analyze,
            layout.workflow_file("analysis_list.json"),
            layout.workflow_file("analyses.json"),
            Arc::new(CommandExecutor::new()),
        ),
    ];

    let report = Pipeline::new().run(&stages).await?;
    println!(
        "pipeline {}: {} stage(s), {} skipped, {} item failure(s)",
        report.run_id,
        report.stages.len(),
        report.skipped(),
        report.total_failed()
    );
    Ok(())
}
