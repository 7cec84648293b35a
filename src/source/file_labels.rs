use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::constants::labels::{
    LABEL_TYPE_COLUMN, LABELS_CSV_FILENAME, LABELS_JSONL_FILENAME, PATIENT_ID_COLUMNS,
    PREDICTION_TIME_COLUMN, SPLIT_COLUMN, VALUE_COLUMN,
};
use crate::data::{LabelClass, LabelValue, LabeledCohort, LabeledExample};
use crate::errors::ShotError;
use crate::source::LabelSource;
use crate::splits::{SplitAssignments, SplitLabel, SplitStore};
use crate::transport::fs::{parse_table, subdirs_containing};
use crate::types::{LabelingFunctionId, PatientId};

/// Reads `<root>/<labeling_function>/labeled_patients.{csv,jsonl}`.
///
/// Split membership comes from a `split` column when the artifact carries one,
/// otherwise from the configured [`SplitStore`]. When both are present they
/// must agree.
pub struct FileLabelStore {
    root: PathBuf,
    split_store: Option<Arc<dyn SplitStore>>,
    numeric_thresholds: HashMap<LabelingFunctionId, f64>,
}

impl std::fmt::Debug for FileLabelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLabelStore")
            .field("root", &self.root)
            .field("has_split_store", &self.split_store.is_some())
            .field("numeric_thresholds", &self.numeric_thresholds)
            .finish()
    }
}

/// String-level view of one artifact row, shared by the CSV and JSONL readers.
struct RawRow {
    line: usize,
    patient_id: Option<String>,
    prediction_time: Option<String>,
    value: Option<String>,
    label_type: Option<String>,
    split: Option<String>,
}

#[derive(Deserialize)]
struct JsonRow {
    #[serde(alias = "omop_person_id", alias = "person_id")]
    patient_id: Option<Value>,
    prediction_time: Option<String>,
    value: Option<Value>,
    label_type: Option<String>,
    split: Option<String>,
}

impl FileLabelStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            split_store: None,
            numeric_thresholds: HashMap::new(),
        }
    }

    /// Use a companion patient → split mapping.
    pub fn with_split_store(mut self, split_store: Arc<dyn SplitStore>) -> Self {
        self.split_store = Some(split_store);
        self
    }

    /// Thresholds binarizing numeric labels (value ≥ threshold is positive).
    pub fn with_numeric_thresholds(mut self, thresholds: HashMap<LabelingFunctionId, f64>) -> Self {
        self.numeric_thresholds = thresholds;
        self
    }

    /// Root directory scanned for labeling functions.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the artifact for `labeling_function`, CSV preferred over JSONL.
    pub fn artifact_path(&self, labeling_function: &str) -> Option<PathBuf> {
        let dir = self.root.join(labeling_function);
        [LABELS_CSV_FILENAME, LABELS_JSONL_FILENAME]
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    fn read_csv_rows(&self, labeling_function: &str, path: &Path) -> Result<Vec<RawRow>, ShotError> {
        let table = parse_table(&read_artifact(labeling_function, path)?);
        let schema = |line: usize, reason: &str| schema_err(labeling_function, path, line, reason);
        if table.header.is_empty() {
            return Err(schema(1, "empty label artifact"));
        }
        let patient_idx = table
            .column(&PATIENT_ID_COLUMNS)
            .ok_or_else(|| schema(1, "missing patient id column"))?;
        let time_idx = table
            .column(&[PREDICTION_TIME_COLUMN])
            .ok_or_else(|| schema(1, "missing prediction_time column"))?;
        let value_idx = table
            .column(&[VALUE_COLUMN])
            .ok_or_else(|| schema(1, "missing value column"))?;
        let type_idx = table.column(&[LABEL_TYPE_COLUMN]);
        let split_idx = table.column(&[SPLIT_COLUMN]);

        let cell = |cells: &[String], idx: usize| {
            cells
                .get(idx)
                .filter(|value| !value.is_empty())
                .cloned()
        };
        let rows = table
            .rows
            .iter()
            .map(|row| {
                if row.cells.len() != table.header.len() {
                    return Err(schema(
                        row.line,
                        &format!(
                            "row has {} columns, header has {}",
                            row.cells.len(),
                            table.header.len()
                        ),
                    ));
                }
                Ok(RawRow {
                    line: row.line,
                    patient_id: cell(&row.cells, patient_idx),
                    prediction_time: cell(&row.cells, time_idx),
                    value: cell(&row.cells, value_idx),
                    label_type: type_idx.and_then(|idx| cell(&row.cells, idx)),
                    split: split_idx.and_then(|idx| cell(&row.cells, idx)),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn read_jsonl_rows(
        &self,
        labeling_function: &str,
        path: &Path,
    ) -> Result<Vec<RawRow>, ShotError> {
        let content = read_artifact(labeling_function, path)?;
        let mut rows = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = idx + 1;
            let parsed: JsonRow = serde_json::from_str(line.trim()).map_err(|err| {
                schema_err(labeling_function, path, line_no, &format!("invalid JSON: {err}"))
            })?;
            rows.push(RawRow {
                line: line_no,
                patient_id: parsed.patient_id.as_ref().and_then(json_scalar),
                prediction_time: parsed.prediction_time,
                value: parsed.value.as_ref().and_then(json_scalar),
                label_type: parsed.label_type,
                split: parsed.split,
            });
        }
        Ok(rows)
    }

    fn build_cohort(
        &self,
        labeling_function: &str,
        path: &Path,
        rows: Vec<RawRow>,
    ) -> Result<LabeledCohort, ShotError> {
        if rows.is_empty() {
            return Err(schema_err(
                labeling_function,
                path,
                1,
                "label artifact has no examples",
            ));
        }
        let threshold = self.numeric_thresholds.get(labeling_function).copied();
        let untyped_kind = infer_label_type(&rows, threshold);
        let mut patients = SplitAssignments::new();
        let mut seen: HashSet<(PatientId, NaiveDateTime)> = HashSet::new();
        let mut examples = Vec::with_capacity(rows.len());

        for raw in rows {
            let schema = |reason: &str| schema_err(labeling_function, path, raw.line, reason);
            let patient_id = raw
                .patient_id
                .ok_or_else(|| schema("missing patient id"))?;
            let prediction_time = raw
                .prediction_time
                .as_deref()
                .ok_or_else(|| schema("missing prediction time"))
                .and_then(|value| {
                    parse_prediction_time(value)
                        .ok_or_else(|| schema(&format!("invalid prediction time '{value}'")))
                })?;
            let raw_value = raw.value.ok_or_else(|| schema("missing label value"))?;
            let kind = raw.label_type.as_deref().unwrap_or(untyped_kind);
            let (value, class) =
                parse_label(&raw_value, kind, threshold).map_err(|reason| schema(&reason))?;
            let split = self
                .resolve_split(&patient_id, raw.split.as_deref())
                .map_err(|reason| schema(&reason))?;
            patients
                .insert(patient_id.clone(), split)
                .map_err(|reason| schema(&reason))?;
            if !seen.insert((patient_id.clone(), prediction_time)) {
                return Err(schema(&format!(
                    "duplicate example for patient '{patient_id}' at {prediction_time}"
                )));
            }
            examples.push(LabeledExample {
                row: examples.len(),
                patient_id,
                prediction_time,
                value,
                class,
                split,
            });
        }

        let cohort = LabeledCohort::new(labeling_function, examples);
        debug!(
            "[shotsplits:labels] '{}' split patients: {:?}",
            labeling_function,
            patients.counts()
        );
        Ok(cohort)
    }

    fn resolve_split(&self, patient_id: &str, tag: Option<&str>) -> Result<SplitLabel, String> {
        let from_store = self
            .split_store
            .as_ref()
            .and_then(|store| store.label_for(patient_id));
        match (tag, from_store) {
            (Some(tag), from_store) => {
                let label = tag.parse::<SplitLabel>()?;
                match from_store {
                    Some(mapped) if mapped != label => Err(format!(
                        "patient '{patient_id}' tagged {label} but split mapping says {mapped}"
                    )),
                    _ => Ok(label),
                }
            }
            (None, Some(mapped)) => Ok(mapped),
            (None, None) => Err(format!("no split assignment for patient '{patient_id}'")),
        }
    }
}

impl LabelSource for FileLabelStore {
    fn load(&self, labeling_function: &str) -> Result<LabeledCohort, ShotError> {
        let Some(path) = self.artifact_path(labeling_function) else {
            return Err(ShotError::DataNotFound {
                labeling_function: labeling_function.to_string(),
                path: self.root.join(labeling_function).join(LABELS_CSV_FILENAME),
            });
        };
        let is_jsonl = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == LABELS_JSONL_FILENAME);
        let rows = if is_jsonl {
            self.read_jsonl_rows(labeling_function, &path)?
        } else {
            self.read_csv_rows(labeling_function, &path)?
        };
        let cohort = self.build_cohort(labeling_function, &path, rows)?;
        info!(
            "[shotsplits:labels] loaded {} examples ({} classes) for '{}' from {}",
            cohort.len(),
            cohort.classes().len(),
            labeling_function,
            path.display()
        );
        Ok(cohort)
    }

    fn labeling_functions(&self) -> Result<Vec<LabelingFunctionId>, ShotError> {
        discover_labeling_functions(&self.root)
    }
}

/// Directories directly under `data_root` holding a label artifact, sorted.
pub fn discover_labeling_functions(data_root: &Path) -> Result<Vec<LabelingFunctionId>, ShotError> {
    if !data_root.is_dir() {
        return Err(ShotError::Configuration(format!(
            "label root {} is not a directory",
            data_root.display()
        )));
    }
    Ok(subdirs_containing(
        data_root,
        &[LABELS_CSV_FILENAME, LABELS_JSONL_FILENAME],
    ))
}

fn schema_err(labeling_function: &str, path: &Path, line: usize, reason: &str) -> ShotError {
    ShotError::Schema {
        context: format!("labels for '{labeling_function}'"),
        path: path.to_path_buf(),
        line,
        reason: reason.to_string(),
    }
}

/// Artifact text; invalid UTF-8 is a schema error on the line it occurs in.
fn read_artifact(labeling_function: &str, path: &Path) -> Result<String, ShotError> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|err| {
        let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
        let line = valid.iter().filter(|byte| **byte == b'\n').count() + 1;
        schema_err(labeling_function, path, line, "label artifact is not valid UTF-8")
    })
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Parse `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS[.f]` or `YYYY-MM-DD`.
pub fn parse_prediction_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Label type of rows that carry none, decided once for the whole artifact:
/// boolean when every such value reads as a boolean, numeric when a threshold
/// is configured, categorical otherwise.
fn infer_label_type(rows: &[RawRow], threshold: Option<f64>) -> &'static str {
    let all_boolean = rows
        .iter()
        .filter(|row| row.label_type.is_none())
        .filter_map(|row| row.value.as_deref())
        .all(|value| parse_bool(value).is_some());
    if all_boolean {
        "boolean"
    } else if threshold.is_some() {
        "numeric"
    } else {
        "categorical"
    }
}

/// Interpret a raw value as a label of type `kind`.
fn parse_label(
    raw: &str,
    kind: &str,
    threshold: Option<f64>,
) -> Result<(LabelValue, LabelClass), String> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "boolean" | "bool" => {
            let flag = parse_bool(raw).ok_or_else(|| format!("malformed boolean label '{raw}'"))?;
            Ok((LabelValue::Boolean(flag), LabelClass::Binary(flag)))
        }
        "categorical" => {
            let category = raw.trim().to_string();
            Ok((
                LabelValue::Categorical(category.clone()),
                LabelClass::Category(category),
            ))
        }
        "numeric" | "numerical" => {
            let value = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| format!("malformed numeric label '{raw}'"))?;
            let threshold = threshold
                .ok_or_else(|| "numeric label without a configured threshold".to_string())?;
            Ok((LabelValue::Numeric(value), LabelClass::Binary(value >= threshold)))
        }
        other => Err(format!("unknown label type '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_labels(root: &Path, labeling_function: &str, name: &str, body: &str) {
        let dir = root.join(labeling_function);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn loads_csv_with_embedded_split() {
        let dir = tempdir().unwrap();
        write_labels(
            dir.path(),
            "guo_icu",
            LABELS_CSV_FILENAME,
            "patient_id,prediction_time,value,label_type,split\n\
             1,2019-01-01 08:00:00,True,boolean,train\n\
             1,2019-02-01 08:00:00,False,boolean,train\n\
             2,2019-03-01,false,boolean,test\n",
        );

        let cohort = FileLabelStore::new(dir.path()).load("guo_icu").unwrap();
        assert_eq!(cohort.len(), 3);
        assert_eq!(cohort.examples()[0].class, LabelClass::Binary(true));
        assert_eq!(cohort.examples()[2].split, SplitLabel::Test);
        assert_eq!(cohort.examples()[2].row, 2);
    }

    #[test]
    fn companion_split_mapping_fills_missing_column() {
        let dir = tempdir().unwrap();
        write_labels(
            dir.path(),
            "lab_anemia",
            LABELS_CSV_FILENAME,
            "patient_id,prediction_time,value,label_type\n\
             10,2020-05-05T10:00:00,0,categorical\n\
             11,2020-05-06T10:00:00,3,categorical\n",
        );
        let mut mapping = SplitAssignments::new();
        mapping.insert("10".into(), SplitLabel::Train).unwrap();
        mapping.insert("11".into(), SplitLabel::Validation).unwrap();

        let cohort = FileLabelStore::new(dir.path())
            .with_split_store(Arc::new(mapping))
            .load("lab_anemia")
            .unwrap();
        assert_eq!(cohort.examples()[1].split, SplitLabel::Validation);
        assert_eq!(
            cohort.classes(),
            &[
                LabelClass::Category("0".into()),
                LabelClass::Category("3".into())
            ]
        );
    }

    #[test]
    fn missing_artifact_is_data_not_found() {
        let dir = tempdir().unwrap();
        let err = FileLabelStore::new(dir.path()).load("guo_los").unwrap_err();
        assert!(matches!(
            err,
            ShotError::DataNotFound { ref labeling_function, .. } if labeling_function == "guo_los"
        ));
    }

    #[test]
    fn schema_errors_carry_line_numbers() {
        let cases = [
            ("patient_id,prediction_time,value,label_type,split\n,2019-01-01,true,boolean,train\n", 2, "missing patient id"),
            ("patient_id,prediction_time,value,label_type,split\n1,2019-01-01,maybe,boolean,train\n", 2, "malformed boolean"),
            ("patient_id,prediction_time,value,label_type,split\n1,2019-01-01,true,boolean,holdout\n", 2, "unknown split tag"),
            ("patient_id,prediction_time,value,label_type,split\n1,yesterday,true,boolean,train\n", 2, "invalid prediction time"),
            ("patient_id,prediction_time,value,label_type\n1,2019-01-01,true,boolean\n", 2, "no split assignment"),
            ("patient_id,value\n1,true\n", 1, "prediction_time"),
            ("patient_id,prediction_time,value,label_type,split\n1,2019-01-01,true,boolean,train\n1,2019-01-02,true,boolean,test\n", 3, "both train and test"),
            ("patient_id,prediction_time,value,label_type,split\n1,2019-01-01,true,boolean,train\n1,2019-01-01,false,boolean,train\n", 3, "duplicate example"),
            ("patient_id,prediction_time,value,label_type,split\n1,2019-01-01,true,train\n", 2, "columns"),
            ("patient_id,prediction_time,value,label_type,split\n", 1, "no examples"),
            ("patient_id,prediction_time,value,label_type,split\n1,2019-01-01,yes,binary,train\n", 2, "unknown label type"),
        ];
        for (body, expected_line, fragment) in cases {
            let dir = tempdir().unwrap();
            write_labels(dir.path(), "guo_icu", LABELS_CSV_FILENAME, body);
            let err = FileLabelStore::new(dir.path()).load("guo_icu").unwrap_err();
            assert!(
                matches!(
                    err,
                    ShotError::Schema { line, ref reason, .. }
                        if line == expected_line && reason.contains(fragment)
                ),
                "unexpected error for {fragment}: {err}"
            );
        }
    }

    #[test]
    fn split_tag_must_agree_with_mapping() {
        let dir = tempdir().unwrap();
        write_labels(
            dir.path(),
            "guo_icu",
            LABELS_CSV_FILENAME,
            "patient_id,prediction_time,value,label_type,split\n1,2019-01-01,true,boolean,train\n",
        );
        let mut mapping = SplitAssignments::new();
        mapping.insert("1".into(), SplitLabel::Test).unwrap();
        let err = FileLabelStore::new(dir.path())
            .with_split_store(Arc::new(mapping))
            .load("guo_icu")
            .unwrap_err();
        assert!(matches!(err, ShotError::Schema { reason, .. } if reason.contains("split mapping says test")));
    }

    #[test]
    fn numeric_labels_need_a_threshold() {
        let dir = tempdir().unwrap();
        write_labels(
            dir.path(),
            "lab_hyperkalemia",
            LABELS_CSV_FILENAME,
            "patient_id,prediction_time,value,label_type,split\n\
             1,2019-01-01,5.9,numeric,train\n\
             2,2019-01-01,4.1,numeric,train\n",
        );
        let err = FileLabelStore::new(dir.path())
            .load("lab_hyperkalemia")
            .unwrap_err();
        assert!(matches!(err, ShotError::Schema { reason, .. } if reason.contains("threshold")));

        let thresholds = HashMap::from([("lab_hyperkalemia".to_string(), 5.5)]);
        let cohort = FileLabelStore::new(dir.path())
            .with_numeric_thresholds(thresholds)
            .load("lab_hyperkalemia")
            .unwrap();
        assert_eq!(cohort.examples()[0].class, LabelClass::Binary(true));
        assert_eq!(cohort.examples()[1].class, LabelClass::Binary(false));
        assert_eq!(cohort.examples()[0].value, LabelValue::Numeric(5.9));
    }

    #[test]
    fn loads_jsonl_artifacts() {
        let dir = tempdir().unwrap();
        write_labels(
            dir.path(),
            "new_celiac",
            LABELS_JSONL_FILENAME,
            "{\"patient_id\": 7, \"prediction_time\": \"2018-06-01T00:00:00\", \"value\": true, \"label_type\": \"boolean\", \"split\": \"val\"}\n\
             \n\
             {\"omop_person_id\": \"8\", \"prediction_time\": \"2018-06-02\", \"value\": false, \"split\": \"train\"}\n",
        );
        let store = FileLabelStore::new(dir.path());
        let cohort = store.load("new_celiac").unwrap();
        assert_eq!(cohort.len(), 2);
        assert_eq!(cohort.examples()[0].patient_id, "7");
        assert_eq!(cohort.examples()[1].patient_id, "8");
        assert_eq!(cohort.examples()[1].class, LabelClass::Binary(false));

        write_labels(dir.path(), "broken", LABELS_JSONL_FILENAME, "{not json\n");
        let err = store.load("broken").unwrap_err();
        assert!(matches!(err, ShotError::Schema { line: 1, .. }));
    }

    #[test]
    fn untyped_values_share_one_label_type() {
        let dir = tempdir().unwrap();
        write_labels(
            dir.path(),
            "lab_anemia",
            LABELS_CSV_FILENAME,
            "patient_id,prediction_time,value,split\n\
             1,2019-01-01,0,train\n\
             2,2019-01-01,1,train\n\
             3,2019-01-01,2,test\n",
        );
        write_labels(
            dir.path(),
            "guo_icu",
            LABELS_CSV_FILENAME,
            "patient_id,prediction_time,value,split\n\
             1,2019-01-01,1,train\n\
             2,2019-01-01,0,test\n",
        );
        let store = FileLabelStore::new(dir.path());

        let anemia = store.load("lab_anemia").unwrap();
        assert_eq!(
            anemia.classes(),
            &[
                LabelClass::Category("0".into()),
                LabelClass::Category("1".into()),
                LabelClass::Category("2".into()),
            ]
        );
        assert_eq!(anemia.examples()[1].value, LabelValue::Categorical("1".into()));

        let icu = store.load("guo_icu").unwrap();
        assert_eq!(
            icu.classes(),
            &[LabelClass::Binary(false), LabelClass::Binary(true)]
        );
    }

    #[test]
    fn untyped_numbers_use_the_threshold_when_configured() {
        let dir = tempdir().unwrap();
        write_labels(
            dir.path(),
            "lab_hyponatremia",
            LABELS_CSV_FILENAME,
            "patient_id,prediction_time,value,split\n\
             1,2019-01-01,0,train\n\
             2,2019-01-01,131.5,train\n",
        );
        let cohort = FileLabelStore::new(dir.path())
            .with_numeric_thresholds(HashMap::from([("lab_hyponatremia".to_string(), 130.0)]))
            .load("lab_hyponatremia")
            .unwrap();
        assert_eq!(cohort.examples()[0].value, LabelValue::Numeric(0.0));
        assert_eq!(cohort.examples()[1].class, LabelClass::Binary(true));
    }

    #[test]
    fn invalid_utf8_is_a_schema_error_with_context() {
        let dir = tempdir().unwrap();
        let task = dir.path().join("guo_los");
        fs::create_dir_all(&task).unwrap();
        let mut body = b"patient_id,prediction_time,value,label_type,split\n".to_vec();
        body.extend_from_slice(b"1,2019-01-01,");
        body.extend_from_slice(&[0xff, 0xfe]);
        body.extend_from_slice(b",boolean,train\n");
        fs::write(task.join(LABELS_CSV_FILENAME), &body).unwrap();
        fs::write(task.join(LABELS_JSONL_FILENAME), [0xffu8, 0xfe]).unwrap();

        let store = FileLabelStore::new(dir.path());
        let err = store.load("guo_los").unwrap_err();
        assert!(matches!(
            err,
            ShotError::Schema { line: 2, ref context, ref reason, .. }
                if context.contains("guo_los") && reason.contains("UTF-8")
        ));
        assert!(err.to_string().contains(LABELS_CSV_FILENAME));

        fs::remove_file(task.join(LABELS_CSV_FILENAME)).unwrap();
        let err = store.load("guo_los").unwrap_err();
        assert!(matches!(err, ShotError::Schema { line: 1, .. }));
    }

    #[test]
    fn labeling_functions_are_discovered_sorted() {
        let dir = tempdir().unwrap();
        let body = "patient_id,prediction_time,value,label_type,split\n";
        write_labels(dir.path(), "guo_readmission", LABELS_CSV_FILENAME, body);
        write_labels(dir.path(), "chexpert", LABELS_JSONL_FILENAME, "");
        fs::create_dir_all(dir.path().join("not_a_task")).unwrap();

        let store = FileLabelStore::new(dir.path());
        assert_eq!(
            store.labeling_functions().unwrap(),
            vec!["chexpert".to_string(), "guo_readmission".to_string()]
        );
        assert!(
            FileLabelStore::new(dir.path().join("missing"))
                .labeling_functions()
                .is_err()
        );
    }

    #[test]
    fn prediction_time_formats() {
        assert!(parse_prediction_time("2019-01-01T08:30:00").is_some());
        assert!(parse_prediction_time("2019-01-01 08:30:00.250").is_some());
        assert!(parse_prediction_time("2019-01-01T08:30").is_some());
        assert_eq!(
            parse_prediction_time("2019-01-01"),
            NaiveDate::from_ymd_opt(2019, 1, 1).map(|date| date.and_time(NaiveTime::MIN))
        );
        assert!(parse_prediction_time("01/01/2019").is_none());
    }
}
