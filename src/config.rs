use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::sampler::{DEFAULT_REPLICATES, DEFAULT_SEED};
use crate::errors::ShotError;
use crate::splits::SplitLabel;
use crate::strategy::StrategyTable;
use crate::types::LabelingFunctionId;

/// What to do with a ShotSet that could not reach its per-class target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsufficientPolicy {
    /// Write whatever was available and report the shortfall.
    #[default]
    WritePartial,
    /// Skip the replicate when any class has no examples at all.
    SkipEmptyClass,
    /// Skip the replicate when any class is below its target.
    SkipShort,
}

/// Top-level shot generation configuration.
#[derive(Clone, Debug)]
pub struct ShotConfig {
    /// Base seed mixed into every replicate seed.
    pub seed: u64,
    /// Replicates per (labeling function, strategy, k).
    pub replicates: usize,
    /// Worker threads for replicate fan-out; `0` uses every available CPU.
    pub num_threads: usize,
    /// Handling of ShotSets that fall short of their target.
    pub insufficient: InsufficientPolicy,
    /// Strategy name → policy table.
    pub strategies: StrategyTable,
    /// Splits copied whole regardless of strategy.
    pub passthrough_splits: Vec<SplitLabel>,
    /// Thresholds binarizing numeric labels, per labeling function.
    pub numeric_thresholds: HashMap<LabelingFunctionId, f64>,
}

impl Default for ShotConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            replicates: DEFAULT_REPLICATES,
            num_threads: 0,
            insufficient: InsufficientPolicy::default(),
            strategies: StrategyTable::default(),
            passthrough_splits: Vec::new(),
            numeric_thresholds: HashMap::new(),
        }
    }
}

impl ShotConfig {
    /// Reject configurations that cannot produce any ShotSet.
    pub fn validate(&self) -> Result<(), ShotError> {
        if self.replicates == 0 {
            return Err(ShotError::Configuration(
                "replicate count must be greater than zero".to_string(),
            ));
        }
        if let Some((name, value)) = self
            .numeric_thresholds
            .iter()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(ShotError::Configuration(format!(
                "numeric threshold for '{name}' must be finite (got {value})"
            )));
        }
        self.strategies.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ShotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.insufficient, InsufficientPolicy::WritePartial);
        assert!(config.passthrough_splits.is_empty());
    }

    #[test]
    fn zero_replicates_are_rejected() {
        let config = ShotConfig {
            replicates: 0,
            ..ShotConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ShotError::Configuration(msg)) if msg.contains("replicate count")
        ));
    }

    #[test]
    fn non_finite_thresholds_are_rejected() {
        let mut config = ShotConfig::default();
        config
            .numeric_thresholds
            .insert("lab_anemia".into(), f64::NAN);
        assert!(config.validate().is_err());
        config.numeric_thresholds.insert("lab_anemia".into(), 7.0);
        assert!(config.validate().is_ok());
    }
}
