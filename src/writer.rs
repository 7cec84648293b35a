use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::constants::writer::MANIFEST_FILENAME;
use crate::errors::ShotError;
use crate::orchestrator::RunReport;
use crate::sampler::{ShotKey, ShotSet};
use crate::transport::fs::write_atomic;

/// Persistence backend for ShotSets.
///
/// Each key is written independently; writing an existing key replaces it.
pub trait ShotWriter: Send + Sync {
    /// Persist one ShotSet under its key.
    fn write(&self, shot_set: &ShotSet) -> Result<(), ShotError>;

    /// Persist the summary of one (labeling function, strategy) run.
    fn write_manifest(&self, _report: &RunReport) -> Result<(), ShotError> {
        Ok(())
    }
}

/// Writes `<root>/<lf>/<strategy>/k_<k>/replicate_<r>/<split>.json`.
#[derive(Clone, Debug)]
pub struct JsonShotWriter {
    root: PathBuf,
}

impl JsonShotWriter {
    /// Create a writer rooted at `root`. Directories are created on demand.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File a ShotSet with `key` is written to.
    pub fn path_for(&self, key: &ShotKey) -> PathBuf {
        self.root
            .join(&key.labeling_function)
            .join(&key.strategy)
            .join(key.count_component())
            .join(format!("replicate_{}", key.replicate))
            .join(format!("{}.json", key.split))
    }

    /// Manifest file for a (labeling function, strategy) run.
    pub fn manifest_path(&self, labeling_function: &str, strategy: &str) -> PathBuf {
        self.root
            .join(labeling_function)
            .join(strategy)
            .join(MANIFEST_FILENAME)
    }
}

impl ShotWriter for JsonShotWriter {
    fn write(&self, shot_set: &ShotSet) -> Result<(), ShotError> {
        let write_err = |reason: String| ShotError::Write {
            key: shot_set.key.to_string(),
            reason,
        };
        let payload =
            serde_json::to_vec_pretty(shot_set).map_err(|err| write_err(err.to_string()))?;
        let path = self.path_for(&shot_set.key);
        write_atomic(&path, &payload)
            .map_err(|err| write_err(format!("{}: {err}", path.display())))
    }

    fn write_manifest(&self, report: &RunReport) -> Result<(), ShotError> {
        let path = self.manifest_path(&report.labeling_function, &report.strategy);
        let write_err = |reason: String| ShotError::Write {
            key: format!("{}/{}/{}", report.labeling_function, report.strategy, MANIFEST_FILENAME),
            reason,
        };
        let payload = serde_json::to_vec_pretty(report).map_err(|err| write_err(err.to_string()))?;
        write_atomic(&path, &payload)
            .map_err(|err| write_err(format!("{}: {err}", path.display())))
    }
}

/// Keeps ShotSets in memory, keyed like the file layout.
#[derive(Debug, Default)]
pub struct MemoryShotWriter {
    shot_sets: RwLock<BTreeMap<ShotKey, ShotSet>>,
    manifests: RwLock<Vec<RunReport>>,
}

impl MemoryShotWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored ShotSet for `key`.
    pub fn get(&self, key: &ShotKey) -> Option<ShotSet> {
        self.shot_sets.read().ok()?.get(key).cloned()
    }

    /// Every stored ShotSet in key order.
    pub fn shot_sets(&self) -> Vec<ShotSet> {
        self.shot_sets
            .read()
            .map(|guard| guard.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every manifest written so far.
    pub fn manifests(&self) -> Vec<RunReport> {
        self.manifests
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ShotWriter for MemoryShotWriter {
    fn write(&self, shot_set: &ShotSet) -> Result<(), ShotError> {
        self.shot_sets
            .write()
            .map_err(|_| ShotError::Write {
                key: shot_set.key.to_string(),
                reason: "lock poisoned".into(),
            })?
            .insert(shot_set.key.clone(), shot_set.clone());
        Ok(())
    }

    fn write_manifest(&self, report: &RunReport) -> Result<(), ShotError> {
        self.manifests
            .write()
            .map_err(|_| ShotError::Write {
                key: format!("{}/{}", report.labeling_function, report.strategy),
                reason: "lock poisoned".into(),
            })?
            .push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LabelClass;
    use crate::sampler::{ClassCount, ShotExample};
    use crate::splits::SplitLabel;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn shot_set(replicate: usize, rows: &[usize]) -> ShotSet {
        let time = NaiveDate::from_ymd_opt(2022, 2, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        ShotSet {
            key: ShotKey {
                labeling_function: "guo_readmission".into(),
                strategy: "few".into(),
                shot_count: Some(1),
                replicate,
                split: SplitLabel::Train,
            },
            seed: 99,
            class_counts: vec![ClassCount {
                class: LabelClass::Binary(true),
                available: 3,
                selected: rows.len(),
            }],
            examples: rows
                .iter()
                .map(|row| ShotExample {
                    row: *row,
                    patient_id: format!("p{row}"),
                    prediction_time: time,
                    class: LabelClass::Binary(true),
                })
                .collect(),
        }
    }

    #[test]
    fn json_writer_uses_keyed_layout_and_overwrites() {
        let dir = tempdir().unwrap();
        let writer = JsonShotWriter::new(dir.path());
        let first = shot_set(3, &[0]);
        writer.write(&first).unwrap();
        let path = writer.path_for(&first.key);
        assert!(path.ends_with("guo_readmission/few/k_1/replicate_3/train.json"));

        let replacement = shot_set(3, &[2]);
        writer.write(&replacement).unwrap();
        let stored: ShotSet = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored, replacement);
    }

    #[test]
    fn json_writer_reports_storage_failures() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "not a directory").unwrap();
        let writer = JsonShotWriter::new(&blocker);
        let err = writer.write(&shot_set(0, &[1])).unwrap_err();
        assert!(matches!(
            err,
            ShotError::Write { ref key, .. } if key == "guo_readmission/few/k_1/replicate_0/train"
        ));
    }

    #[test]
    fn memory_writer_replaces_by_key() {
        let writer = MemoryShotWriter::new();
        writer.write(&shot_set(0, &[0])).unwrap();
        writer.write(&shot_set(0, &[1])).unwrap();
        writer.write(&shot_set(1, &[2])).unwrap();
        let stored = writer.shot_sets();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].examples[0].row, 1);
        assert_eq!(writer.get(&shot_set(1, &[]).key).unwrap().examples[0].row, 2);
    }
}
