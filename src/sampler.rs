use chrono::NaiveDateTime;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::sampler::SPLIT_SEED_OFFSET;
use crate::constants::writer::PASSTHROUGH_COUNT_DIR;
use crate::data::{LabelClass, LabeledCohort, LabeledExample};
use crate::hash::{mix64, stable_hash_parts};
use crate::splits::SplitLabel;
use crate::types::{
    LabelingFunctionId, PatientId, ReplicateIndex, RowIndex, ShotCount, StrategyName,
};

/// SplitMix64 generator behind every draw.
///
/// Built fresh per (labeling function, strategy, k, replicate, split), so a
/// draw never depends on what ran before it.
#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    const GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn step(&mut self) -> u64 {
        self.state = self.state.wrapping_add(Self::GAMMA);
        let mixed = (self.state ^ (self.state >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        let mixed = (mixed ^ (mixed >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        mixed ^ (mixed >> 31)
    }
}

impl rand::RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Storage key of one ShotSet.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShotKey {
    /// Labeling function sampled from.
    pub labeling_function: LabelingFunctionId,
    /// Strategy name the policy was resolved from.
    pub strategy: StrategyName,
    /// Per-class target, `None` for passthrough.
    pub shot_count: Option<ShotCount>,
    /// Replicate index.
    pub replicate: ReplicateIndex,
    /// Split the examples come from.
    pub split: SplitLabel,
}

impl ShotKey {
    /// Directory component for the target count (`k_4`, `k_all`).
    pub fn count_component(&self) -> String {
        match self.shot_count {
            Some(k) => format!("k_{k}"),
            None => PASSTHROUGH_COUNT_DIR.to_string(),
        }
    }
}

impl fmt::Display for ShotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/replicate_{}/{}",
            self.labeling_function,
            self.strategy,
            self.count_component(),
            self.replicate,
            self.split
        )
    }
}

/// One selected example, as persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotExample {
    /// Row of the example in the loaded label artifact.
    pub row: RowIndex,
    /// Patient the example belongs to.
    pub patient_id: PatientId,
    /// Prediction time of the example.
    pub prediction_time: NaiveDateTime,
    /// Sampling class.
    pub class: LabelClass,
}

impl From<&LabeledExample> for ShotExample {
    fn from(example: &LabeledExample) -> Self {
        Self {
            row: example.row,
            patient_id: example.patient_id.clone(),
            prediction_time: example.prediction_time,
            class: example.class.clone(),
        }
    }
}

/// Achieved vs. available count for one class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCount {
    /// Class the counts refer to.
    pub class: LabelClass,
    /// Examples of the class present in the split.
    pub available: usize,
    /// Examples of the class selected.
    pub selected: usize,
}

/// Selected examples for one (labeling function, strategy, k, replicate, split).
///
/// Examples are ordered by class (canonical order) and, within a class, by
/// row. The order is part of the output contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotSet {
    /// Storage key.
    pub key: ShotKey,
    /// Seed the draw used (0 for passthrough).
    pub seed: u64,
    /// Per-class counts, in canonical class order.
    pub class_counts: Vec<ClassCount>,
    /// Selected examples.
    pub examples: Vec<ShotExample>,
}

impl ShotSet {
    /// Number of selected examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// True when nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Selected count for `class`.
    pub fn selected_for(&self, class: &LabelClass) -> usize {
        self.class_counts
            .iter()
            .find(|count| &count.class == class)
            .map(|count| count.selected)
            .unwrap_or(0)
    }
}

/// Non-fatal: a class had fewer examples than requested.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsufficientClassSamples {
    /// Affected ShotSet.
    pub key: ShotKey,
    /// Class that fell short.
    pub class: LabelClass,
    /// Examples available in the split.
    pub available: usize,
    /// Requested per-class count (`None` for passthrough).
    pub target: Option<ShotCount>,
}

impl InsufficientClassSamples {
    /// True when the class is entirely absent from the split.
    pub fn is_empty_class(&self) -> bool {
        self.available == 0
    }
}

impl fmt::Display for InsufficientClassSamples {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Some(target) => write!(
                f,
                "{}: class '{}' has {} of {} requested examples",
                self.key, self.class, self.available, target
            ),
            None => write!(f, "{}: class '{}' has no examples", self.key, self.class),
        }
    }
}

/// ShotSet plus the shortfalls encountered while drawing it.
#[derive(Clone, Debug)]
pub struct SampleOutcome {
    /// Drawn ShotSet.
    pub shot_set: ShotSet,
    /// Classes that fell short.
    pub warnings: Vec<InsufficientClassSamples>,
}

/// Seed for one (labeling function, strategy, k, replicate) combination.
pub fn replicate_seed(
    base_seed: u64,
    labeling_function: &str,
    strategy: &str,
    shot_count: Option<ShotCount>,
    replicate: ReplicateIndex,
) -> u64 {
    let count = shot_count.map(|k| k.to_string()).unwrap_or_default();
    let replicate = replicate.to_string();
    mix64(stable_hash_parts(
        base_seed,
        [labeling_function, strategy, count.as_str(), replicate.as_str()],
    ))
}

fn split_seed(replicate_seed: u64, split: SplitLabel) -> u64 {
    let ordinal = match split {
        SplitLabel::Train => 1u64,
        SplitLabel::Validation => 2,
        SplitLabel::Test => 3,
    };
    mix64(replicate_seed ^ SPLIT_SEED_OFFSET.wrapping_mul(ordinal))
}

/// Per-split shot sampler.
///
/// Stateless apart from configuration: every call derives its own generator,
/// so calls can run in any order or concurrently.
#[derive(Clone, Debug, Default)]
pub struct ShotSampler {
    seed: u64,
    passthrough_splits: Vec<SplitLabel>,
}

impl ShotSampler {
    /// Create a sampler mixing `seed` into every draw.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            passthrough_splits: Vec::new(),
        }
    }

    /// Splits that are copied whole whatever the target.
    pub fn with_passthrough_splits(mut self, splits: Vec<SplitLabel>) -> Self {
        self.passthrough_splits = splits;
        self
    }

    /// Draw the ShotSet for one split.
    ///
    /// With `shot_count = Some(k)`, each class keeps all of its examples when it
    /// has at most `k`, otherwise exactly `k` drawn uniformly without
    /// replacement. With `None` (or a passthrough split) every example is kept.
    pub fn sample(
        &self,
        cohort: &LabeledCohort,
        strategy: &str,
        shot_count: Option<ShotCount>,
        replicate: ReplicateIndex,
        split: SplitLabel,
    ) -> SampleOutcome {
        let key = ShotKey {
            labeling_function: cohort.labeling_function().to_string(),
            strategy: strategy.to_string(),
            shot_count,
            replicate,
            split,
        };
        let target = shot_count.filter(|_| !self.passthrough_splits.contains(&split));
        let seed = match target {
            Some(_) => split_seed(
                replicate_seed(
                    self.seed,
                    cohort.labeling_function(),
                    strategy,
                    shot_count,
                    replicate,
                ),
                split,
            ),
            None => 0,
        };
        let mut rng = DeterministicRng::new(seed);

        let mut examples = Vec::new();
        let mut class_counts = Vec::new();
        let mut warnings = Vec::new();
        for (class, bucket) in cohort.by_class(split) {
            let available = bucket.len();
            let selected: Vec<&LabeledExample> = match target {
                Some(k) if available > k => {
                    let mut picks = index::sample(&mut rng, available, k).into_vec();
                    picks.sort_unstable();
                    picks.into_iter().map(|idx| bucket[idx]).collect()
                }
                _ => bucket,
            };
            let short = match target {
                Some(k) => available < k,
                None => available == 0,
            };
            if short {
                warnings.push(InsufficientClassSamples {
                    key: key.clone(),
                    class: class.clone(),
                    available,
                    target,
                });
            }
            class_counts.push(ClassCount {
                class,
                available,
                selected: selected.len(),
            });
            examples.extend(selected.into_iter().map(ShotExample::from));
        }

        SampleOutcome {
            shot_set: ShotSet {
                key,
                seed,
                class_counts,
                examples,
            },
            warnings,
        }
    }
}
