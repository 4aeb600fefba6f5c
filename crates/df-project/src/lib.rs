//! df-project: the task registry file format and input validation.

pub mod region;
pub mod schema;
pub mod validate;

pub use region::{Region, RegionShape, RegionSpec, ShapeKind, Vec3};
pub use schema::*;
pub use validate::{ValidationError, validate_case_count, validate_registry};

use std::io::Write;
use std::path::Path;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Registry path has no parent directory: {path}")]
    InvalidPath { path: String },
}

/// Parse and validate a registry document.
pub fn from_json_str(content: &str) -> ProjectResult<Registry> {
    let registry: Registry = serde_json::from_str(content)?;
    validate_registry(&registry)?;
    Ok(registry)
}

pub fn load_json(path: &Path) -> ProjectResult<Registry> {
    let content = std::fs::read_to_string(path)?;
    from_json_str(&content)
}

/// Write the registry wholesale.
///
/// The document is written to a sibling temp file and renamed over `path`, so
/// readers never observe a half-written registry.
pub fn save_json(path: &Path, registry: &Registry) -> ProjectResult<()> {
    validate_registry(registry)?;
    let content = serde_json::to_string_pretty(registry)?;

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| ProjectError::InvalidPath {
            path: path.display().to_string(),
        })?;
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
