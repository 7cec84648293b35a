use crate::splits::SplitLabel;

/// Constants used by stable hashing and seed derivation.
pub mod hash {
    /// FNV-1a 64-bit offset basis.
    pub const FNV1A64_OFFSET: u64 = 0xcbf29ce484222325;
    /// FNV-1a 64-bit prime.
    pub const FNV1A64_PRIME: u64 = 0x100000001b3;
    /// Byte mixed in between hashed parts.
    pub const PART_SEPARATOR: u8 = 0x1f;
}

/// Constants used by sampler runtime behavior.
pub mod sampler {
    /// Default base seed mixed into every replicate seed.
    pub const DEFAULT_SEED: u64 = 42;
    /// Default number of replicates per (labeling function, strategy, k).
    pub const DEFAULT_REPLICATES: usize = 5;
    /// Offset mixed into per-split seed derivation.
    pub const SPLIT_SEED_OFFSET: u64 = 0x5B1D_5EED;
}

/// Constants used by the strategy table.
pub mod strategy {
    /// Strategy name for small per-class counts.
    pub const FEW: &str = "few";
    /// Strategy name for large per-class counts.
    pub const LONG: &str = "long";
    /// Strategy name for the identity policy.
    pub const ALL: &str = "all";
    /// Default per-class counts for `few`.
    pub const FEW_SHOT_COUNTS: [usize; 11] = [1, 2, 4, 8, 12, 16, 24, 32, 48, 64, 128];
    /// Default per-class counts for `long`.
    pub const LONG_SHOT_COUNTS: [usize; 3] = [256, 512, 1024];
}

/// Constants used by split parsing and iteration.
pub mod splits {
    use super::SplitLabel;

    /// Canonical split iteration order.
    pub const ALL_SPLITS: [SplitLabel; 3] =
        [SplitLabel::Train, SplitLabel::Validation, SplitLabel::Test];
}

/// Constants used by the label store reader.
pub mod labels {
    /// CSV label artifact filename inside each labeling-function directory.
    pub const LABELS_CSV_FILENAME: &str = "labeled_patients.csv";
    /// JSON-lines label artifact filename inside each labeling-function directory.
    pub const LABELS_JSONL_FILENAME: &str = "labeled_patients.jsonl";
    /// Accepted patient id column names, in lookup order.
    pub const PATIENT_ID_COLUMNS: [&str; 3] = ["patient_id", "omop_person_id", "person_id"];
    /// Prediction time column name.
    pub const PREDICTION_TIME_COLUMN: &str = "prediction_time";
    /// Label value column name.
    pub const VALUE_COLUMN: &str = "value";
    /// Label type column name.
    pub const LABEL_TYPE_COLUMN: &str = "label_type";
    /// Split column name (label artifact or companion mapping).
    pub const SPLIT_COLUMN: &str = "split";
}

/// Constants used by the shot writer.
pub mod writer {
    /// Per-(labeling function, strategy) run summary filename.
    pub const MANIFEST_FILENAME: &str = "manifest.json";
    /// Directory component used when a ShotSet has no target count.
    pub const PASSTHROUGH_COUNT_DIR: &str = "k_all";
    /// Suffix of in-flight files before they are renamed into place.
    pub const TEMP_SUFFIX: &str = ".tmp";
}

/// Labeling functions of the benchmark, grouped as reported.
pub mod tasks {
    /// Operational outcomes.
    pub const OPERATIONAL_OUTCOMES: [&str; 3] = ["guo_los", "guo_readmission", "guo_icu"];
    /// Anticipating lab test results.
    pub const LAB_VALUES: [&str; 5] = [
        "lab_thrombocytopenia",
        "lab_hyperkalemia",
        "lab_hypoglycemia",
        "lab_hyponatremia",
        "lab_anemia",
    ];
    /// Assignment of new diagnoses.
    pub const NEW_DIAGNOSES: [&str; 6] = [
        "new_hypertension",
        "new_hyperlipidemia",
        "new_pancan",
        "new_celiac",
        "new_lupus",
        "new_acutemi",
    ];
    /// Chest x-ray findings.
    pub const CHEXPERT: [&str; 1] = ["chexpert"];

    /// Task group name for a labeling function, if it is one of the benchmark's.
    pub fn task_group(labeling_function: &str) -> Option<&'static str> {
        if OPERATIONAL_OUTCOMES.contains(&labeling_function) {
            Some("operational_outcomes")
        } else if LAB_VALUES.contains(&labeling_function) {
            Some("lab_values")
        } else if NEW_DIAGNOSES.contains(&labeling_function) {
            Some("new_diagnoses")
        } else if CHEXPERT.contains(&labeling_function) {
            Some("chexpert")
        } else {
            None
        }
    }
}
