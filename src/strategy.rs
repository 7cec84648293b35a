use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::constants::strategy::{ALL, FEW, FEW_SHOT_COUNTS, LONG, LONG_SHOT_COUNTS};
use crate::errors::ShotError;
use crate::types::{ShotCount, StrategyName};

/// Sampling policy a strategy name resolves to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShotPolicy {
    /// Draw up to `k` examples per class, once for every `k` in `counts`.
    PerClass {
        /// Target per-class counts, in production order.
        counts: Vec<ShotCount>,
    },
    /// Keep every example of the split.
    Passthrough,
}

impl ShotPolicy {
    /// Targets to produce: `Some(k)` per count, or a single `None` for passthrough.
    pub fn targets(&self) -> Vec<Option<ShotCount>> {
        match self {
            ShotPolicy::PerClass { counts } => counts.iter().copied().map(Some).collect(),
            ShotPolicy::Passthrough => vec![None],
        }
    }

    fn validate(&self, name: &str) -> Result<(), ShotError> {
        if let ShotPolicy::PerClass { counts } = self {
            if counts.is_empty() {
                return Err(ShotError::Configuration(format!(
                    "strategy '{name}' has no shot counts"
                )));
            }
            if counts.contains(&0) {
                return Err(ShotError::Configuration(format!(
                    "strategy '{name}' has a zero shot count"
                )));
            }
            let mut seen = counts.clone();
            seen.sort_unstable();
            seen.dedup();
            if seen.len() != counts.len() {
                return Err(ShotError::Configuration(format!(
                    "strategy '{name}' repeats a shot count"
                )));
            }
        }
        Ok(())
    }
}

/// Injectable strategy name → policy table.
///
/// Serialized as a plain JSON object, e.g.
/// `{"few": {"kind": "per_class", "counts": [1, 2, 4]}, "all": {"kind": "passthrough"}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyTable {
    strategies: BTreeMap<StrategyName, ShotPolicy>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::empty()
            .with_strategy(
                FEW,
                ShotPolicy::PerClass {
                    counts: FEW_SHOT_COUNTS.to_vec(),
                },
            )
            .with_strategy(
                LONG,
                ShotPolicy::PerClass {
                    counts: LONG_SHOT_COUNTS.to_vec(),
                },
            )
            .with_strategy(ALL, ShotPolicy::Passthrough)
    }
}

impl StrategyTable {
    /// Table with no registered strategies.
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// Register (or replace) `name`.
    pub fn with_strategy(mut self, name: impl Into<StrategyName>, policy: ShotPolicy) -> Self {
        self.strategies.insert(name.into(), policy);
        self
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Resolve a strategy name. Unregistered names fail before any sampling.
    pub fn resolve(&self, name: &str) -> Result<&ShotPolicy, ShotError> {
        self.strategies
            .get(name)
            .ok_or_else(|| ShotError::UnknownStrategy {
                name: name.to_string(),
                registered: self.names().join(", "),
            })
    }

    /// Check every registered policy.
    pub fn validate(&self) -> Result<(), ShotError> {
        if self.strategies.is_empty() {
            return Err(ShotError::Configuration(
                "strategy table is empty".to_string(),
            ));
        }
        for (name, policy) in &self.strategies {
            policy.validate(name)?;
        }
        Ok(())
    }

    /// Load and validate a table from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ShotError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            ShotError::Configuration(format!(
                "failed to read strategy table {}: {err}",
                path.display()
            ))
        })?;
        let table: Self = serde_json::from_str(&raw).map_err(|err| {
            ShotError::Configuration(format!(
                "failed to parse strategy table {}: {err}",
                path.display()
            ))
        })?;
        table.validate()?;
        Ok(table)
    }
}
