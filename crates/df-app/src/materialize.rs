//! Case directories instantiated from per-type templates.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::registry_service::RegistryService;
use df_project::{Registry, RunCase};
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Copy `src` into the new directory `dst`.
///
/// `dst` itself must not exist; its parent is created as needed.
fn copy_tree(src: &Path, dst: &Path) -> AppResult<usize> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir(dst).map_err(|e| match e.kind() {
        IoErrorKind::AlreadyExists => AppError::TargetExists {
            path: dst.to_path_buf(),
        },
        _ => e.into(),
    })?;

    let mut files = 0;
    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| AppError::Io(e.into()))?;
        let rel = entry.path().strip_prefix(src).map_err(|_| AppError::Config {
            message: format!("template entry outside {}", src.display()),
        })?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            files += 1;
        }
    }
    Ok(files)
}

/// Materialize one case: `<runs_dir>/<name>` from its type's template.
pub fn materialize_case(config: &AppConfig, name: &str, case: &RunCase) -> AppResult<PathBuf> {
    if !config.is_supported(&case.case_type) {
        return Err(AppError::UnsupportedCaseType {
            case_type: case.case_type.to_string(),
        });
    }
    let template = config.template_dir(&case.case_type);
    if !template.is_dir() {
        return Err(AppError::TemplateMissing {
            case_type: case.case_type.to_string(),
            path: template,
        });
    }
    let target = config.case_dir(name);
    if target.exists() {
        return Err(AppError::TargetExists { path: target });
    }

    match copy_tree(&template, &target) {
        Ok(files) => {
            info!(case = name, files, path = %target.display(), "materialized case directory");
            Ok(target)
        }
        Err(AppError::TargetExists { path }) => Err(AppError::TargetExists { path }),
        Err(e) => {
            // Partial copies are removed so a retry can succeed.
            let _ = fs::remove_dir_all(&target);
            Err(e)
        }
    }
}

/// Materialize every case of `registry` independently.
pub fn materialize(
    config: &AppConfig,
    registry: &Registry,
) -> Vec<(String, AppResult<PathBuf>)> {
    let cases: Vec<(&String, &RunCase)> = registry.run_cases.iter().collect();
    cases
        .into_par_iter()
        .map(|(name, case)| {
            let result = materialize_case(config, name, case);
            if let Err(e) = &result {
                warn!(case = %name, error = %e, "case not materialized");
            }
            (name.clone(), result)
        })
        .collect()
}

/// Materialize all cases of the stored registry.
pub fn materialize_cases(config: &AppConfig) -> AppResult<Vec<(String, AppResult<PathBuf>)>> {
    let registry = RegistryService::new(config).get()?;
    Ok(materialize(config, &registry))
}
