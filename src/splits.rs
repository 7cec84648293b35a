use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::constants::labels::{PATIENT_ID_COLUMNS, SPLIT_COLUMN};
use crate::errors::ShotError;
use crate::transport::fs::read_table;
use crate::types::PatientId;

/// Patient-level dataset partitions, fixed upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitLabel {
    /// Training split.
    Train,
    /// Validation split.
    #[serde(rename = "val")]
    Validation,
    /// Test split.
    Test,
}

impl SplitLabel {
    /// Short tag used in file names and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            SplitLabel::Train => "train",
            SplitLabel::Validation => "val",
            SplitLabel::Test => "test",
        }
    }
}

impl fmt::Display for SplitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitLabel {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(SplitLabel::Train),
            "val" | "valid" | "validation" => Ok(SplitLabel::Validation),
            "test" => Ok(SplitLabel::Test),
            other => Err(format!("unknown split tag '{other}'")),
        }
    }
}

/// Patient → split lookup.
///
/// Implementations never reassign a patient: examples of one patient always
/// land in the same split.
pub trait SplitStore: Send + Sync {
    /// Split assigned to `patient`, if known.
    fn label_for(&self, patient: &str) -> Option<SplitLabel>;
}

/// In-memory patient → split mapping.
#[derive(Clone, Debug, Default)]
pub struct SplitAssignments {
    assignments: HashMap<PatientId, SplitLabel>,
}

impl SplitAssignments {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `patient` in `label`. Re-inserting the same pair is a no-op;
    /// moving a patient to a different split is rejected.
    pub fn insert(&mut self, patient: PatientId, label: SplitLabel) -> Result<(), String> {
        match self.assignments.get(&patient) {
            Some(existing) if *existing != label => Err(format!(
                "patient '{patient}' assigned to both {existing} and {label}"
            )),
            Some(_) => Ok(()),
            None => {
                self.assignments.insert(patient, label);
                Ok(())
            }
        }
    }

    /// Number of assigned patients.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// True when no patient is assigned.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Patient counts per split.
    pub fn counts(&self) -> HashMap<SplitLabel, usize> {
        let mut counts = HashMap::new();
        for label in self.assignments.values() {
            *counts.entry(*label).or_insert(0) += 1;
        }
        counts
    }

    /// Load a companion `patient_id,split` mapping.
    pub fn from_csv(path: &Path) -> Result<Self, ShotError> {
        let context = "split mapping".to_string();
        let schema_err = |line: usize, reason: String| ShotError::Schema {
            context: context.clone(),
            path: path.to_path_buf(),
            line,
            reason,
        };
        if !path.is_file() {
            return Err(ShotError::Configuration(format!(
                "split mapping not found at {}",
                path.display()
            )));
        }
        let table = read_table(path)?;
        let patient_idx = table
            .column(&PATIENT_ID_COLUMNS)
            .ok_or_else(|| schema_err(1, "missing patient id column".into()))?;
        let split_idx = table
            .column(&[SPLIT_COLUMN])
            .ok_or_else(|| schema_err(1, "missing split column".into()))?;

        let mut assignments = Self::new();
        for row in &table.rows {
            let patient = row
                .cells
                .get(patient_idx)
                .filter(|cell| !cell.is_empty())
                .ok_or_else(|| schema_err(row.line, "missing patient id".into()))?;
            let label = row
                .cells
                .get(split_idx)
                .ok_or_else(|| schema_err(row.line, "missing split tag".into()))?
                .parse::<SplitLabel>()
                .map_err(|reason| schema_err(row.line, reason))?;
            assignments
                .insert(patient.clone(), label)
                .map_err(|reason| schema_err(row.line, reason))?;
        }
        Ok(assignments)
    }
}

impl SplitStore for SplitAssignments {
    fn label_for(&self, patient: &str) -> Option<SplitLabel> {
        self.assignments.get(patient).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn split_tags_parse_with_aliases() {
        assert_eq!("train".parse::<SplitLabel>(), Ok(SplitLabel::Train));
        assert_eq!("VAL".parse::<SplitLabel>(), Ok(SplitLabel::Validation));
        assert_eq!("valid".parse::<SplitLabel>(), Ok(SplitLabel::Validation));
        assert_eq!(" test ".parse::<SplitLabel>(), Ok(SplitLabel::Test));
        assert!("holdout".parse::<SplitLabel>().is_err());
    }

    #[test]
    fn split_label_display_matches_serde_tag() {
        for label in crate::constants::splits::ALL_SPLITS {
            let json = serde_json::to_string(&label).unwrap();
            assert_eq!(json, format!("\"{label}\""));
        }
    }

    #[test]
    fn insert_rejects_moving_a_patient() {
        let mut assignments = SplitAssignments::new();
        assignments.insert("p1".into(), SplitLabel::Train).unwrap();
        assignments.insert("p1".into(), SplitLabel::Train).unwrap();
        let err = assignments
            .insert("p1".into(), SplitLabel::Test)
            .unwrap_err();
        assert!(err.contains("both train and test"));
        assert_eq!(assignments.len(), 1);
    }

    #[test]
    fn from_csv_loads_omop_style_mapping() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("splits.csv");
        fs::write(&path, "omop_person_id,split\n1,train\n2,val\n3,test\n4,train\n").unwrap();

        let assignments = SplitAssignments::from_csv(&path).unwrap();
        assert_eq!(assignments.len(), 4);
        assert_eq!(assignments.label_for("2"), Some(SplitLabel::Validation));
        assert_eq!(assignments.label_for("9"), None);
        assert_eq!(assignments.counts().get(&SplitLabel::Train), Some(&2));
    }

    #[test]
    fn from_csv_reports_unknown_split_with_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("splits.csv");
        fs::write(&path, "patient_id,split\n1,train\n2,holdout\n").unwrap();

        let err = SplitAssignments::from_csv(&path).unwrap_err();
        assert!(matches!(
            err,
            ShotError::Schema { line: 3, ref reason, .. } if reason.contains("holdout")
        ));
    }

    #[test]
    fn from_csv_requires_existing_file() {
        let dir = tempdir().unwrap();
        let err = SplitAssignments::from_csv(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, ShotError::Configuration(msg) if msg.contains("not found")));
    }
}
