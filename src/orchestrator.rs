use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{InsufficientPolicy, ShotConfig};
use crate::constants::splits::ALL_SPLITS;
use crate::data::{LabelClass, LabeledCohort};
use crate::errors::ShotError;
use crate::sampler::{InsufficientClassSamples, ShotKey, ShotSampler};
use crate::source::LabelSource;
use crate::splits::SplitLabel;
use crate::strategy::ShotPolicy;
use crate::types::{LabelingFunctionId, ReplicateIndex, ShotCount, StrategyName};
use crate::writer::ShotWriter;

/// A ShotSet that was drawn but deliberately not written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedShot {
    /// Key that was not written.
    pub key: ShotKey,
    /// Why it was skipped.
    pub reason: String,
}

/// A ShotSet whose write failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedShot {
    /// Key that failed.
    pub key: ShotKey,
    /// Error text.
    pub error: String,
}

/// Shortfalls aggregated over a run for one (split, class).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningSummary {
    /// Split the shortfalls occurred in.
    pub split: SplitLabel,
    /// Class that fell short.
    pub class: LabelClass,
    /// Number of ShotSets affected.
    pub occurrences: usize,
    /// Examples available in the split.
    pub available: usize,
    /// Largest target that could not be met (`None` for passthrough).
    pub max_target: Option<ShotCount>,
}

/// Outcome of one (labeling function, strategy) run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Labeling function sampled.
    pub labeling_function: LabelingFunctionId,
    /// Strategy sampled.
    pub strategy: StrategyName,
    /// Replicate jobs run (targets × replicates).
    pub replicates: usize,
    /// Replicate jobs with at least one shortfall, skip, or failed write.
    pub partial_replicates: usize,
    /// ShotSets written.
    pub written: Vec<ShotKey>,
    /// ShotSets skipped by the insufficient-samples policy.
    pub skipped: Vec<SkippedShot>,
    /// ShotSets whose write failed.
    pub failed: Vec<FailedShot>,
    /// Shortfalls, one entry per (split, class).
    pub warnings: Vec<WarningSummary>,
    /// Error text when the run manifest could not be written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_error: Option<String>,
}

impl RunReport {
    /// True when every ShotSet that should have been written was, and so was
    /// the manifest.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.manifest_error.is_none()
    }
}

/// Reports of every labeling function run in one batch.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Reports of runs that completed, in request order.
    pub reports: Vec<RunReport>,
    /// Labeling functions whose run aborted, with the fatal error.
    pub aborted: Vec<(LabelingFunctionId, ShotError)>,
}

impl BatchSummary {
    /// True when a run aborted or any write failed.
    pub fn has_failures(&self) -> bool {
        !self.aborted.is_empty() || self.reports.iter().any(|report| !report.is_clean())
    }
}

#[derive(Default)]
struct JobResult {
    written: Vec<ShotKey>,
    skipped: Vec<SkippedShot>,
    failed: Vec<FailedShot>,
    warnings: Vec<InsufficientClassSamples>,
}

impl JobResult {
    fn is_partial(&self) -> bool {
        !(self.skipped.is_empty() && self.failed.is_empty() && self.warnings.is_empty())
    }
}

/// Drives the sampler across replicates and hands results to the writer.
///
/// Labels are loaded once per labeling function and shared read-only by every
/// replicate job; each job writes only its own keys.
pub struct ReplicateOrchestrator {
    config: ShotConfig,
    source: Arc<dyn LabelSource>,
    writer: Arc<dyn ShotWriter>,
    sampler: ShotSampler,
    pool: rayon::ThreadPool,
}

impl ReplicateOrchestrator {
    /// Validate `config` and build the worker pool.
    pub fn new(
        config: ShotConfig,
        source: Arc<dyn LabelSource>,
        writer: Arc<dyn ShotWriter>,
    ) -> Result<Self, ShotError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(|idx| format!("shotsplits-worker-{idx}"))
            .build()
            .map_err(|err| ShotError::Configuration(format!("failed to build worker pool: {err}")))?;
        let sampler = ShotSampler::new(config.seed)
            .with_passthrough_splits(config.passthrough_splits.clone());
        Ok(Self {
            config,
            source,
            writer,
            sampler,
            pool,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &ShotConfig {
        &self.config
    }

    /// Run one labeling function under one strategy.
    pub fn run(&self, labeling_function: &str, strategy: &str) -> Result<RunReport, ShotError> {
        let mut reports = self.run_strategies(labeling_function, &[strategy.to_string()])?;
        reports
            .pop()
            .ok_or_else(|| ShotError::Configuration("no strategy requested".to_string()))
    }

    /// Run one labeling function under several strategies, loading its labels once.
    ///
    /// Strategy names are resolved before the load, so an unknown name fails
    /// without touching the label store.
    pub fn run_strategies(
        &self,
        labeling_function: &str,
        strategies: &[StrategyName],
    ) -> Result<Vec<RunReport>, ShotError> {
        let policies = strategies
            .iter()
            .map(|name| {
                self.config
                    .strategies
                    .resolve(name)
                    .map(|policy| (name.as_str(), policy.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let cohort = self.source.load(labeling_function)?;
        Ok(policies
            .into_iter()
            .map(|(name, policy)| self.run_cohort(&cohort, name, &policy))
            .collect())
    }

    /// Run every labeling function in turn. A fatal error aborts only the
    /// labeling function it occurred in.
    pub fn run_many(
        &self,
        labeling_functions: &[LabelingFunctionId],
        strategies: &[StrategyName],
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for labeling_function in labeling_functions {
            match self.run_strategies(labeling_function, strategies) {
                Ok(reports) => summary.reports.extend(reports),
                Err(err) => {
                    warn!(
                        "[shotsplits:orchestrator] aborted '{}': {}",
                        labeling_function, err
                    );
                    summary.aborted.push((labeling_function.clone(), err));
                }
            }
        }
        summary
    }

    /// Sample and write every (target, replicate) of `policy` for a loaded cohort.
    pub fn run_cohort(
        &self,
        cohort: &LabeledCohort,
        strategy: &str,
        policy: &ShotPolicy,
    ) -> RunReport {
        let jobs: Vec<(Option<ShotCount>, ReplicateIndex)> = policy
            .targets()
            .into_iter()
            .flat_map(|target| (0..self.config.replicates).map(move |replicate| (target, replicate)))
            .collect();
        info!(
            "[shotsplits:orchestrator] '{}' strategy '{}': {} replicate jobs over {} examples",
            cohort.labeling_function(),
            strategy,
            jobs.len(),
            cohort.len()
        );

        let results: Vec<JobResult> = self.pool.install(|| {
            jobs.par_iter()
                .map(|(target, replicate)| self.run_job(cohort, strategy, *target, *replicate))
                .collect()
        });

        let mut report = RunReport {
            labeling_function: cohort.labeling_function().to_string(),
            strategy: strategy.to_string(),
            replicates: jobs.len(),
            ..RunReport::default()
        };
        let mut warnings = Vec::new();
        for result in results {
            if result.is_partial() {
                report.partial_replicates += 1;
            }
            report.written.extend(result.written);
            report.skipped.extend(result.skipped);
            report.failed.extend(result.failed);
            warnings.extend(result.warnings);
        }
        report.warnings = summarize_warnings(&warnings);
        for summary in &report.warnings {
            warn!(
                "[shotsplits:orchestrator] '{}' strategy '{}': class '{}' in {} short in {} shot sets (available {}, largest target {})",
                report.labeling_function,
                report.strategy,
                summary.class,
                summary.split,
                summary.occurrences,
                summary.available,
                summary
                    .max_target
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "all".to_string())
            );
        }
        for failure in &report.failed {
            warn!(
                "[shotsplits:orchestrator] write failed for {}: {}",
                failure.key, failure.error
            );
        }
        if let Err(err) = self.writer.write_manifest(&report) {
            warn!("[shotsplits:orchestrator] manifest not written: {}", err);
            report.manifest_error = Some(err.to_string());
        }
        info!(
            "[shotsplits:orchestrator] '{}' strategy '{}': wrote {}, skipped {}, failed {}, partial replicates {}/{}",
            report.labeling_function,
            report.strategy,
            report.written.len(),
            report.skipped.len(),
            report.failed.len(),
            report.partial_replicates,
            report.replicates
        );
        report
    }

    fn run_job(
        &self,
        cohort: &LabeledCohort,
        strategy: &str,
        target: Option<ShotCount>,
        replicate: ReplicateIndex,
    ) -> JobResult {
        let mut result = JobResult::default();
        for split in ALL_SPLITS {
            let outcome = self
                .sampler
                .sample(cohort, strategy, target, replicate, split);
            let key = outcome.shot_set.key.clone();
            if let Some(reason) = skip_reason(self.config.insufficient, &outcome.warnings) {
                debug!("[shotsplits:orchestrator] skipping {}: {}", key, reason);
                result.skipped.push(SkippedShot { key, reason });
            } else {
                match self.writer.write(&outcome.shot_set) {
                    Ok(()) => {
                        debug!(
                            "[shotsplits:orchestrator] wrote {} ({} examples)",
                            key,
                            outcome.shot_set.len()
                        );
                        result.written.push(key);
                    }
                    Err(err) => result.failed.push(FailedShot {
                        key,
                        error: err.to_string(),
                    }),
                }
            }
            result.warnings.extend(outcome.warnings);
        }
        result
    }
}

fn skip_reason(
    policy: InsufficientPolicy,
    warnings: &[InsufficientClassSamples],
) -> Option<String> {
    let warning = match policy {
        InsufficientPolicy::WritePartial => None,
        InsufficientPolicy::SkipEmptyClass => warnings.iter().find(|w| w.is_empty_class()),
        InsufficientPolicy::SkipShort => warnings.first(),
    }?;
    Some(match warning.target {
        Some(target) => format!(
            "class '{}' has {} of {} requested examples",
            warning.class, warning.available, target
        ),
        None => format!("class '{}' has no examples", warning.class),
    })
}

fn summarize_warnings(warnings: &[InsufficientClassSamples]) -> Vec<WarningSummary> {
    let mut grouped: BTreeMap<(SplitLabel, LabelClass), WarningSummary> = BTreeMap::new();
    for warning in warnings {
        let entry = grouped
            .entry((warning.key.split, warning.class.clone()))
            .or_insert_with(|| WarningSummary {
                split: warning.key.split,
                class: warning.class.clone(),
                occurrences: 0,
                available: warning.available,
                max_target: None,
            });
        entry.occurrences += 1;
        entry.max_target = entry.max_target.max(warning.target);
    }
    grouped.into_values().collect()
}
