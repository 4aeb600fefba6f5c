//! Error types for the df-app service layer.

use serde::Serialize;
use serde_json::{Value, json};
use std::path::PathBuf;

/// Closed set of failure categories reported to tool callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "ConfigurationError")]
    Configuration,
    #[serde(rename = "ValidationError")]
    Validation,
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "AlreadyExistsError")]
    AlreadyExists,
    #[serde(rename = "UnsupportedError")]
    Unsupported,
    #[serde(rename = "ExternalProcessError")]
    ExternalProcess,
    #[serde(rename = "TimeoutError")]
    Timeout,
    #[serde(rename = "IOError")]
    Io,
}

/// Application error type wrapping the backend crates' errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Task registry already exists at {path}")]
    RegistryExists { path: PathBuf },

    #[error("Task registry not found at {path}; initialize it first")]
    RegistryMissing { path: PathBuf },

    #[error("Unsupported case type: {case_type}")]
    UnsupportedCaseType { case_type: String },

    #[error("Run case not found: {name}")]
    UnknownCase { name: String },

    #[error("Validation failed: {0}")]
    Validation(df_project::ValidationError),

    #[error("Case template not found for {case_type} at {path}")]
    TemplateMissing { case_type: String, path: PathBuf },

    #[error("Case directory already exists: {path}")]
    TargetExists { path: PathBuf },

    #[error("Case directory not found: {path}; materialize the cases first")]
    CaseDirMissing { path: PathBuf },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("No 'regions' list found in {path}")]
    AnchorNotFound { path: PathBuf },

    #[error("Corrupted region block '{id}' in {path}")]
    CorruptedBlock { id: String, path: PathBuf },

    #[error("Unsupported region shape: {shape}")]
    UnsupportedShape { shape: String },

    #[error("No preset ignition layout for {count} zones (supported: 2, 3, 4)")]
    UnsupportedLayout { count: usize },

    #[error("Entry script {script} not found in {dir}")]
    ScriptNotFound { script: String, dir: PathBuf },

    #[error("Script {script} exited with {}: {stderr}", .exit_code.map_or_else(|| "no exit code".to_string(), |c| format!("code {c}")))]
    ExecutionFailed {
        script: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Script {script} timed out after {timeout_s} s")]
    Timeout { script: String, timeout_s: u64 },

    #[error("Field files not found in {dir}: {}", .missing.join(", "))]
    FieldNotFound { dir: PathBuf, missing: Vec<String> },

    #[error("No solution time directories in {dir}")]
    NoTimeDirectory { dir: PathBuf },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Timed out waiting for registry lock {path}")]
    LockTimeout { path: PathBuf },

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("{action} needs confirmation; pass --yes to proceed")]
    ConfirmationRequired { action: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for df-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config { .. } => ErrorKind::Configuration,
            AppError::Validation(_)
            | AppError::Parse { .. }
            | AppError::CorruptedBlock { .. }
            | AppError::ConfirmationRequired { .. } => ErrorKind::Validation,
            AppError::RegistryExists { .. } | AppError::TargetExists { .. } => {
                ErrorKind::AlreadyExists
            }
            AppError::RegistryMissing { .. }
            | AppError::UnknownCase { .. }
            | AppError::TemplateMissing { .. }
            | AppError::CaseDirMissing { .. }
            | AppError::FileNotFound { .. }
            | AppError::AnchorNotFound { .. }
            | AppError::ScriptNotFound { .. }
            | AppError::FieldNotFound { .. }
            | AppError::NoTimeDirectory { .. }
            | AppError::RunNotFound(_) => ErrorKind::NotFound,
            AppError::UnsupportedCaseType { .. }
            | AppError::UnsupportedShape { .. }
            | AppError::UnsupportedLayout { .. } => ErrorKind::Unsupported,
            AppError::ExecutionFailed { .. } => ErrorKind::ExternalProcess,
            AppError::Timeout { .. } | AppError::LockTimeout { .. } => ErrorKind::Timeout,
            AppError::Json(_) | AppError::Io(_) => ErrorKind::Io,
        }
    }

    /// Structured payload for the tool envelope, when the error carries one.
    pub fn details(&self) -> Option<Value> {
        match self {
            AppError::Validation(df_project::ValidationError::InvalidValue { field, value, .. }) => {
                Some(json!({ "field": field, "value": value }))
            }
            AppError::Validation(df_project::ValidationError::MissingField { field }) => {
                Some(json!({ "field": field }))
            }
            AppError::ExecutionFailed {
                exit_code, stderr, ..
            } => Some(json!({ "exit_code": exit_code, "stderr": stderr })),
            AppError::FieldNotFound { dir, missing } => {
                Some(json!({ "dir": dir, "missing": missing }))
            }
            AppError::TemplateMissing { path, .. }
            | AppError::TargetExists { path }
            | AppError::FileNotFound { path }
            | AppError::AnchorNotFound { path } => Some(json!({ "path": path })),
            _ => None,
        }
    }
}

impl From<df_project::ValidationError> for AppError {
    fn from(err: df_project::ValidationError) -> Self {
        match err {
            df_project::ValidationError::UnsupportedShape { shape } => {
                AppError::UnsupportedShape { shape }
            }
            other => AppError::Validation(other),
        }
    }
}

impl From<df_project::ProjectError> for AppError {
    fn from(err: df_project::ProjectError) -> Self {
        match err {
            df_project::ProjectError::Validation(e) => e.into(),
            df_project::ProjectError::Io(e) => AppError::Io(e),
            df_project::ProjectError::Json(e) => AppError::Json(e),
            df_project::ProjectError::InvalidPath { path } => AppError::Config {
                message: format!("invalid registry path: {path}"),
            },
        }
    }
}

impl From<df_setfields::SetFieldsError> for AppError {
    fn from(err: df_setfields::SetFieldsError) -> Self {
        use df_setfields::SetFieldsError;
        match err {
            SetFieldsError::FileNotFound { path } => AppError::FileNotFound { path },
            SetFieldsError::AnchorNotFound { path } => AppError::AnchorNotFound { path },
            SetFieldsError::UnterminatedBlock { id, path } => AppError::CorruptedBlock { id, path },
            SetFieldsError::UnsupportedShape { shape } => AppError::UnsupportedShape { shape },
            SetFieldsError::InvalidRegion(e) => AppError::Validation(e),
            SetFieldsError::UnsupportedLayout { count } => AppError::UnsupportedLayout { count },
            SetFieldsError::Io(e) => AppError::Io(e),
        }
    }
}

impl From<df_results::ResultsError> for AppError {
    fn from(err: df_results::ResultsError) -> Self {
        use df_results::ResultsError;
        match err {
            ResultsError::Io(e) => AppError::Io(e),
            ResultsError::Json(e) => AppError::Json(e),
            ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            ResultsError::FieldNotFound { dir, missing } => AppError::FieldNotFound { dir, missing },
            ResultsError::Parse { path, message } => AppError::Parse { path, message },
            ResultsError::NoTimeDirectory { dir } => AppError::NoTimeDirectory { dir },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_with_error_suffix() {
        let kind = AppError::Timeout {
            script: "Allrun".to_string(),
            timeout_s: 5,
        }
        .kind();
        assert_eq!(serde_json::to_value(kind).unwrap(), json!("TimeoutError"));
        assert_eq!(
            serde_json::to_value(ErrorKind::Io).unwrap(),
            json!("IOError")
        );
    }

    #[test]
    fn shape_errors_map_to_unsupported() {
        let err: AppError = df_setfields::SetFieldsError::from(
            df_project::ValidationError::UnsupportedShape {
                shape: "triangle".to_string(),
            },
        )
        .into();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn execution_failure_keeps_stderr_verbatim() {
        let err = AppError::ExecutionFailed {
            script: "Allrun".to_string(),
            exit_code: Some(3),
            stderr: "  blockMesh: FOAM FATAL ERROR\n".to_string(),
        };
        let details = err.details().unwrap();
        assert_eq!(details["stderr"], "  blockMesh: FOAM FATAL ERROR\n");
        assert_eq!(details["exit_code"], 3);
        assert!(err.to_string().contains("code 3"));
    }
}
