use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{LabelingFunctionId, StrategyName};

/// Error type for label loading, strategy resolution, and shot persistence.
#[derive(Debug, Error)]
pub enum ShotError {
    #[error("labels for '{labeling_function}' not found at {}", path.display())]
    DataNotFound {
        labeling_function: LabelingFunctionId,
        path: PathBuf,
    },
    #[error("malformed {context} ({}:{line}): {reason}", path.display())]
    Schema {
        context: String,
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("unknown shot strategy '{name}' (registered: {registered})")]
    UnknownStrategy {
        name: StrategyName,
        registered: String,
    },
    #[error("failed to write shot set {key}: {reason}")]
    Write { key: String, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("configuration error: {0}")]
    Configuration(String),
}
