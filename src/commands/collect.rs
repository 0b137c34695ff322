use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::artifacts::ArtifactSet;
use crate::cli::CollectArgs;
use crate::config::{
    MODEL_CONFIG_LOCK_PATH, ModelConfig, resolve_model_config, write_model_config_lockfile,
};
use crate::metrics::{
    CalculatorRegistry, CollectOptions, MetricEntry, MetricsCollector, MetricsReport,
    ModelRegistry, format_report,
};
use crate::model::MetricsReportManifest;
use crate::store::HistoryStore;
use crate::util::{
    now_utc_string, resolve_db_path, utc_compact_string, write_json_pretty, write_json_stdout,
};

const REPORT_MANIFEST_VERSION: u32 = 1;

pub fn run(args: CollectArgs) -> Result<()> {
    let config = resolve_model_config(&args.models)?;
    let persist = !args.no_persist;

    if persist {
        let lock_path = args.cache_root.join(MODEL_CONFIG_LOCK_PATH);
        write_model_config_lockfile(&config, &lock_path)?;
        info!(
            path = %lock_path.display(),
            checksum = %config.checksum(),
            "wrote model config lock"
        );
    }

    let models = Arc::new(ModelRegistry::from_config(&config)?);
    let options = CollectOptions {
        metric_timeout: args.metric_timeout_ms.map(Duration::from_millis),
        parallel: args.parallel,
    };
    let report_dir = args
        .report_dir
        .clone()
        .unwrap_or_else(|| args.cache_root.join("reports"));
    let mut history = if persist {
        let db_path = resolve_db_path(&args.cache_root, args.db_path.as_ref());
        Some(HistoryStore::open(&db_path)?)
    } else {
        None
    };

    let mut manifests = Vec::<MetricsReportManifest>::with_capacity(args.run_ids.len());
    let mut failed_runs = Vec::<&str>::new();
    for run_id in &args.run_ids {
        let outcome = collect_run(
            &args,
            &config,
            &models,
            options,
            &report_dir,
            history.as_mut(),
            run_id,
        );
        match outcome {
            Ok(manifest) => manifests.push(manifest),
            Err(err) => {
                warn!(run_id = %run_id, error = %format!("{err:#}"), "run collection failed");
                failed_runs.push(run_id);
            }
        }
    }

    if args.json {
        write_json_stdout(&manifests)?;
    }

    let failed = manifests
        .iter()
        .map(|manifest| manifest.failed_count)
        .sum::<usize>();
    info!(
        runs = manifests.len(),
        failed_runs = failed_runs.len(),
        failed_metrics = failed,
        "collect completed"
    );

    if !failed_runs.is_empty() {
        bail!(
            "failed to collect {} of {} runs: {}",
            failed_runs.len(),
            args.run_ids.len(),
            failed_runs.join(", ")
        );
    }
    Ok(())
}

fn collect_run(
    args: &CollectArgs,
    config: &ModelConfig,
    models: &Arc<ModelRegistry>,
    options: CollectOptions,
    report_dir: &Path,
    history: Option<&mut HistoryStore>,
    run_id: &str,
) -> Result<MetricsReportManifest> {
    let collector = MetricsCollector::open(
        &args.storage_root,
        run_id,
        Arc::clone(models),
        CalculatorRegistry::standard(),
        options,
    )?;
    let report = collector.collect();
    let manifest = build_manifest(config, collector.artifacts(), &report)?;

    if !args.json {
        println!("{}\n", format_report(&report));
    }

    if let Some(store) = history {
        let report_path = persist_report(report_dir, &manifest)?;
        let row_id = store.record_report(&manifest)?;
        info!(
            run_id = %run_id,
            path = %report_path.display(),
            history_row = row_id,
            "persisted metrics report"
        );
    }

    Ok(manifest)
}

pub fn build_manifest(
    config: &ModelConfig,
    artifacts: &ArtifactSet,
    report: &MetricsReport,
) -> Result<MetricsReportManifest> {
    Ok(MetricsReportManifest {
        manifest_version: REPORT_MANIFEST_VERSION,
        run_id: report.run_id.clone(),
        generated_at: now_utc_string(),
        model_config: config.clone(),
        model_config_checksum: config.checksum(),
        artifacts: artifacts.digests()?,
        entries: report.entries.iter().map(MetricEntry::to_record).collect(),
        failed_count: report.failed_count(),
        duration_ms: report.duration.as_millis(),
    })
}

fn persist_report(report_dir: &Path, manifest: &MetricsReportManifest) -> Result<PathBuf> {
    let path = report_dir.join(format!(
        "{}_{}.json",
        manifest.run_id,
        utc_compact_string(Utc::now())
    ));
    write_json_pretty(&path, manifest)?;
    Ok(path)
}
