//! df-results: solver output parsing and dispatch run records.

pub mod scalar;
pub mod series;
pub mod store;
pub mod types;

pub use scalar::{ScalarField, parse_scalar_field, read_scalar_field};
pub use series::{ScalarTable, latest_time_dir, read_scalar_series, time_dirs};
pub use store::DispatchStore;
pub use types::*;

use std::path::PathBuf;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Field files not found in {dir}: {}", .missing.join(", "))]
    FieldNotFound { dir: PathBuf, missing: Vec<String> },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("No time directories in {dir}")]
    NoTimeDirectory { dir: PathBuf },
}
