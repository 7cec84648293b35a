use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::splits::SplitLabel;

pub use crate::types::{LabelingFunctionId, PatientId, RowIndex};

/// Raw label value as produced by the labeling function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    /// Binary outcome.
    Boolean(bool),
    /// Discrete class (e.g. lab value bins, finding bitmasks).
    Categorical(String),
    /// Continuous measurement, binarized against a per-task threshold.
    Numeric(f64),
}

/// Sampling class derived from a [`LabelValue`].
///
/// The derived `Ord` is the canonical class order: `false < true < categories`,
/// categories compared lexicographically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelClass {
    /// Boolean (or thresholded numeric) class.
    Binary(bool),
    /// Categorical class.
    Category(String),
}

impl fmt::Display for LabelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelClass::Binary(value) => write!(f, "{value}"),
            LabelClass::Category(value) => f.write_str(value),
        }
    }
}

/// One labeled (patient, prediction time) example.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    /// Position of the row in the loaded artifact; stable for a fixed input.
    pub row: RowIndex,
    /// Patient the example belongs to.
    pub patient_id: PatientId,
    /// Time at which the prediction is made.
    pub prediction_time: NaiveDateTime,
    /// Label as produced upstream.
    pub value: LabelValue,
    /// Class used for per-class sampling.
    pub class: LabelClass,
    /// Split of the patient.
    pub split: SplitLabel,
}

impl LabeledExample {
    /// Stable example identifier, `patient@prediction_time`.
    pub fn example_id(&self) -> String {
        format!(
            "{}@{}",
            self.patient_id,
            self.prediction_time.format("%Y-%m-%dT%H:%M:%S")
        )
    }
}

/// All labeled examples of one labeling function, read-only once loaded.
#[derive(Clone, Debug)]
pub struct LabeledCohort {
    labeling_function: LabelingFunctionId,
    examples: Vec<LabeledExample>,
    classes: Vec<LabelClass>,
}

impl LabeledCohort {
    /// Build a cohort. The class universe is the sorted union of observed
    /// classes; binary tasks always include both `false` and `true`.
    pub fn new(labeling_function: impl Into<LabelingFunctionId>, examples: Vec<LabeledExample>) -> Self {
        let mut classes: BTreeSet<LabelClass> =
            examples.iter().map(|example| example.class.clone()).collect();
        if classes
            .iter()
            .any(|class| matches!(class, LabelClass::Binary(_)))
        {
            classes.insert(LabelClass::Binary(false));
            classes.insert(LabelClass::Binary(true));
        }
        Self {
            labeling_function: labeling_function.into(),
            examples,
            classes: classes.into_iter().collect(),
        }
    }

    /// Labeling function the examples belong to.
    pub fn labeling_function(&self) -> &str {
        &self.labeling_function
    }

    /// Every example in load order.
    pub fn examples(&self) -> &[LabeledExample] {
        &self.examples
    }

    /// Canonical class order.
    pub fn classes(&self) -> &[LabelClass] {
        &self.classes
    }

    /// Number of loaded examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// True when nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Examples of `split`, bucketed by class. Every class of the universe is
    /// present (possibly empty), in canonical order; each bucket keeps load order.
    pub fn by_class(&self, split: SplitLabel) -> IndexMap<LabelClass, Vec<&LabeledExample>> {
        let mut buckets: IndexMap<LabelClass, Vec<&LabeledExample>> = self
            .classes
            .iter()
            .map(|class| (class.clone(), Vec::new()))
            .collect();
        for example in self.examples.iter().filter(|example| example.split == split) {
            buckets
                .entry(example.class.clone())
                .or_default()
                .push(example);
        }
        buckets
    }

    /// Example counts per (split, class).
    pub fn counts(&self) -> HashMap<(SplitLabel, LabelClass), usize> {
        let mut counts = HashMap::new();
        for example in &self.examples {
            *counts
                .entry((example.split, example.class.clone()))
                .or_insert(0) += 1;
        }
        counts
    }
}
