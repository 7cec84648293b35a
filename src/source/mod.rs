//! Label store interfaces.
//!
//! - `LabelSource` is the loader the orchestrator reads a cohort from, once per
//!   labeling function, before any replicate starts.
//! - `FileLabelStore` reads the per-task label artifacts written by the
//!   external labeling step.
//! - `InMemoryLabelSource` serves prebuilt cohorts (tests, embedding callers).

use std::collections::BTreeMap;

use crate::data::LabeledCohort;
use crate::errors::ShotError;
use crate::types::LabelingFunctionId;

/// File-backed label store.
pub mod file_labels;

pub use file_labels::{FileLabelStore, discover_labeling_functions};

/// Loader of labeled cohorts keyed by labeling function.
///
/// Loading has no side effects; for fixed inputs the returned cohort (and its
/// example order) is identical across calls.
pub trait LabelSource: Send + Sync {
    /// Load every labeled example of `labeling_function`.
    fn load(&self, labeling_function: &str) -> Result<LabeledCohort, ShotError>;

    /// Labeling functions this source can load, sorted.
    fn labeling_functions(&self) -> Result<Vec<LabelingFunctionId>, ShotError>;
}

/// Label source over prebuilt cohorts.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLabelSource {
    cohorts: BTreeMap<LabelingFunctionId, LabeledCohort>,
}

impl InMemoryLabelSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cohort under its labeling function.
    pub fn with_cohort(mut self, cohort: LabeledCohort) -> Self {
        self.cohorts
            .insert(cohort.labeling_function().to_string(), cohort);
        self
    }
}

impl LabelSource for InMemoryLabelSource {
    fn load(&self, labeling_function: &str) -> Result<LabeledCohort, ShotError> {
        self.cohorts
            .get(labeling_function)
            .cloned()
            .ok_or_else(|| ShotError::DataNotFound {
                labeling_function: labeling_function.to_string(),
                path: format!("memory://{labeling_function}").into(),
            })
    }

    fn labeling_functions(&self) -> Result<Vec<LabelingFunctionId>, ShotError> {
        Ok(self.cohorts.keys().cloned().collect())
    }
}
