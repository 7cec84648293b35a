/// Identifier naming a clinical prediction task.
/// Examples: `guo_readmission`, `lab_anemia`, `new_celiac`
pub type LabelingFunctionId = String;
/// Patient identifier as written by the label extraction step.
/// Examples: `115967096`, `pt-0042`
pub type PatientId = String;
/// Registered shot strategy name.
/// Examples: `few`, `long`, `all`
pub type StrategyName = String;
/// Zero-based replicate index.
pub type ReplicateIndex = usize;
/// Target number of examples per class.
pub type ShotCount = usize;
/// Row position of an example inside its loaded label artifact.
pub type RowIndex = usize;
