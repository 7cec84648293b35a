#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line runner shared by the `make_shots` binary.
pub mod app;
/// Run configuration types.
pub mod config;
/// Centralized constants used across sampler, sources, and writers.
pub mod constants;
/// Labeled example and cohort types.
pub mod data;
mod hash;
/// Shot set summary metrics.
pub mod metrics;
/// Replicate fan-out and run reporting.
pub mod orchestrator;
/// Per-class shot sampling.
pub mod sampler;
/// Label sources.
pub mod source;
/// Patient split assignments.
pub mod splits;
/// Shot strategies and the strategy table.
pub mod strategy;
/// Input/output transports (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// ShotSet persistence.
pub mod writer;

mod errors;

pub use config::{InsufficientPolicy, ShotConfig};
pub use data::{LabelClass, LabelValue, LabeledCohort, LabeledExample};
pub use errors::ShotError;
pub use metrics::{ClassBalance, class_balance};
pub use orchestrator::{BatchSummary, ReplicateOrchestrator, RunReport};
pub use sampler::{
    InsufficientClassSamples, SampleOutcome, ShotKey, ShotSampler, ShotSet, replicate_seed,
};
pub use source::{FileLabelStore, InMemoryLabelSource, LabelSource};
pub use splits::{SplitAssignments, SplitLabel, SplitStore};
pub use strategy::{ShotPolicy, StrategyTable};
pub use types::{LabelingFunctionId, PatientId, ReplicateIndex, ShotCount, StrategyName};
pub use writer::{JsonShotWriter, MemoryShotWriter, ShotWriter};
