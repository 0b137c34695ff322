use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use super::ImageRole;
use super::calculators::Calculator;
use super::registry::{CalculatorRegistry, ModelRegistry};
use super::report::{MetricEntry, MetricFailure, MetricsReport, format_report};
use crate::artifacts::ArtifactSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    /// Upper bound per metric; a metric past it reports its sentinel.
    pub metric_timeout: Option<Duration>,
    /// Run every metric on its own scoped thread.
    pub parallel: bool,
}

#[derive(Debug, Clone)]
struct MetricJob {
    key: String,
    role: Option<ImageRole>,
    calculator: Calculator,
}

/// Scores one run's artifact triple with every registered calculator.
pub struct MetricsCollector {
    artifacts: Arc<ArtifactSet>,
    models: Arc<ModelRegistry>,
    calculators: CalculatorRegistry,
    options: CollectOptions,
}

impl MetricsCollector {
    /// Loads the artifacts for `run_id`; a missing or unreadable artifact
    /// fails here rather than during collection.
    pub fn open(
        storage_root: &Path,
        run_id: &str,
        models: Arc<ModelRegistry>,
        calculators: CalculatorRegistry,
        options: CollectOptions,
    ) -> Result<Self> {
        let artifacts = ArtifactSet::load(storage_root, run_id)?;
        debug!(
            run_id,
            run_dir = %artifacts.paths.run_dir.display(),
            description_chars = artifacts.description.chars().count(),
            "loaded run artifacts"
        );

        Ok(Self {
            artifacts: Arc::new(artifacts),
            models,
            calculators,
            options,
        })
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// Runs every calculator over every applicable pairing. Never fails: a
    /// metric that errors, panics or times out reports its sentinel.
    pub fn collect(&self) -> MetricsReport {
        let started = Instant::now();
        let jobs = self
            .calculators
            .plan()
            .into_iter()
            .map(|(key, role, calculator)| MetricJob {
                key,
                role,
                calculator,
            })
            .collect::<Vec<MetricJob>>();

        let entries = if self.options.parallel {
            self.run_parallel(&jobs)
        } else {
            jobs.iter().map(|job| self.run_job(job)).collect()
        };

        let report = MetricsReport {
            run_id: self.artifacts.run_id.clone(),
            entries,
            duration: started.elapsed(),
        };
        info!(
            run_id = %report.run_id,
            metrics = report.entries.len(),
            failed = report.failed_count(),
            duration_ms = report.duration.as_millis() as u64,
            parallel = self.options.parallel,
            "metrics collected"
        );
        report
    }

    /// Collects and renders the title-cased text report.
    pub fn report(&self) -> String {
        let text = format_report(&self.collect());
        info!(run_id = %self.artifacts.run_id, "\n{text}");
        text
    }

    fn run_parallel(&self, jobs: &[MetricJob]) -> Vec<MetricEntry> {
        thread::scope(|scope| {
            let handles = jobs
                .iter()
                .map(|job| scope.spawn(move || self.run_job(job)))
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .zip(jobs)
                .map(|(handle, job)| {
                    handle.join().unwrap_or_else(|payload| {
                        self.entry_for(
                            job,
                            Err(MetricFailure::Panicked(panic_message(payload.as_ref()))),
                            Duration::ZERO,
                        )
                    })
                })
                .collect()
        })
    }

    fn run_job(&self, job: &MetricJob) -> MetricEntry {
        let started = Instant::now();
        let outcome = match self.options.metric_timeout {
            Some(limit) => self.run_with_timeout(job, limit),
            None => run_guarded(&self.models, &self.artifacts, job),
        };
        self.entry_for(job, outcome, started.elapsed())
    }

    /// Runs the job on a detached worker. A worker that overruns keeps going
    /// in the background; its late result is dropped.
    fn run_with_timeout(&self, job: &MetricJob, limit: Duration) -> Result<f64, MetricFailure> {
        let (sender, receiver) = mpsc::channel();
        let models = Arc::clone(&self.models);
        let artifacts = Arc::clone(&self.artifacts);
        let worker_job = job.clone();

        let spawned = thread::Builder::new()
            .name(format!("metric-{}", job.key))
            .spawn(move || {
                let _ = sender.send(run_guarded(&models, &artifacts, &worker_job));
            });
        if let Err(err) = spawned {
            return Err(MetricFailure::Error(format!(
                "failed to spawn metric worker: {err}"
            )));
        }

        match receiver.recv_timeout(limit) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(MetricFailure::TimedOut(limit)),
            Err(RecvTimeoutError::Disconnected) => Err(MetricFailure::Error(
                "metric worker exited without a result".to_string(),
            )),
        }
    }

    fn entry_for(
        &self,
        job: &MetricJob,
        outcome: Result<f64, MetricFailure>,
        duration: Duration,
    ) -> MetricEntry {
        let sentinel = job.calculator.failure_sentinel();
        match &outcome {
            Ok(score) => info!(
                run_id = %self.artifacts.run_id,
                key = %job.key,
                score,
                duration_ms = duration.as_millis() as u64,
                "metric computed"
            ),
            Err(failure) => warn!(
                run_id = %self.artifacts.run_id,
                key = %job.key,
                status = failure.status(),
                error = %failure,
                sentinel,
                "metric failed; reporting sentinel"
            ),
        }

        MetricEntry {
            key: job.key.clone(),
            metric: job.calculator.name(),
            role: job.role,
            outcome,
            sentinel,
            duration,
        }
    }
}

fn run_guarded(
    models: &ModelRegistry,
    artifacts: &ArtifactSet,
    job: &MetricJob,
) -> Result<f64, MetricFailure> {
    match panic::catch_unwind(AssertUnwindSafe(|| evaluate(models, artifacts, job))) {
        Ok(Ok(score)) if score.is_nan() => Err(MetricFailure::Error(
            "metric produced NaN".to_string(),
        )),
        Ok(Ok(score)) => Ok(score),
        Ok(Err(err)) => Err(MetricFailure::Error(format!("{err:#}"))),
        Err(payload) => Err(MetricFailure::Panicked(panic_message(payload.as_ref()))),
    }
}

fn evaluate(models: &ModelRegistry, artifacts: &ArtifactSet, job: &MetricJob) -> Result<f64> {
    match (job.calculator, job.role) {
        (Calculator::ImageText(metric), Some(role)) => {
            metric.compute(models, artifacts.image(role), &artifacts.description)
        }
        (Calculator::ImageText(metric), None) => Err(anyhow!(
            "{} compares an image with the description but has no image role",
            metric.name()
        )),
        (Calculator::ImageImage(metric), _) => metric.compute(
            models,
            artifacts.image(ImageRole::Original),
            artifacts.image(ImageRole::Generated),
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
