use crate::data::LabelClass;
use crate::sampler::ShotSet;

/// Aggregate class-balance metrics for one ShotSet.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassBalance {
    pub total: usize,
    pub classes: usize,
    pub min: usize,
    pub max: usize,
    pub ratio: f64,
    pub per_class: Vec<ClassShare>,
}

/// Per-class share of a ShotSet.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassShare {
    pub class: LabelClass,
    pub count: usize,
    pub share: f64,
}

/// Compute balance metrics from a ShotSet's per-class selected counts.
/// Returns `None` when the ShotSet has no classes.
pub fn class_balance(shot_set: &ShotSet) -> Option<ClassBalance> {
    let counts = &shot_set.class_counts;
    let min = counts.iter().map(|count| count.selected).min()?;
    let max = counts.iter().map(|count| count.selected).max()?;
    let total: usize = counts.iter().map(|count| count.selected).sum();
    let ratio = if min == 0 {
        f64::INFINITY
    } else {
        max as f64 / min as f64
    };
    let per_class = counts
        .iter()
        .map(|count| ClassShare {
            class: count.class.clone(),
            count: count.selected,
            share: if total == 0 {
                0.0
            } else {
                count.selected as f64 / total as f64
            },
        })
        .collect();
    Some(ClassBalance {
        total,
        classes: counts.len(),
        min,
        max,
        ratio,
        per_class,
    })
}
