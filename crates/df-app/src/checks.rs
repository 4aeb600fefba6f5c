//! Pre-flight checks: solver environment and case completeness.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use serde::Serialize;
use std::path::Path;

pub const DEEPFLAME_ENV_VAR: &str = "DF_ROOT";
pub const OPENFOAM_ENV_VAR: &str = "WM_PROJECT_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolverEnvReport {
    pub deepflame: Option<String>,
    pub openfoam: Option<String>,
    pub missing: Vec<String>,
}

impl SolverEnvReport {
    pub fn is_ready(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Report which solver environments are loaded, given a variable lookup.
pub fn solver_env_with(lookup: impl Fn(&str) -> Option<String>) -> SolverEnvReport {
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let deepflame = read(DEEPFLAME_ENV_VAR);
    let openfoam = read(OPENFOAM_ENV_VAR);
    let missing = [
        (DEEPFLAME_ENV_VAR, deepflame.is_none()),
        (OPENFOAM_ENV_VAR, openfoam.is_none()),
    ]
    .into_iter()
    .filter(|(_, absent)| *absent)
    .map(|(name, _)| name.to_string())
    .collect();
    SolverEnvReport {
        deepflame,
        openfoam,
        missing,
    }
}

pub fn check_solver_env() -> SolverEnvReport {
    solver_env_with(|name| std::env::var(name).ok())
}

const ESSENTIAL_FILES: [&str; 4] = [
    "system/controlDict",
    "system/fvSchemes",
    "system/fvSolution",
    "constant/polyMesh/boundary",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    pub case_dir: String,
    pub missing: Vec<String>,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

fn present(case_dir: &Path, rel: &str) -> bool {
    let path = case_dir.join(rel);
    path.is_file() || case_dir.join(format!("{rel}.gz")).is_file()
}

/// List the essentials a case directory lacks; gzipped files count as present.
pub fn case_completeness(case_dir: &Path, required_fields: &[String]) -> CompletenessReport {
    let field_files = required_fields.iter().map(|f| format!("0/{f}"));
    let missing = ESSENTIAL_FILES
        .iter()
        .map(|s| s.to_string())
        .chain(field_files)
        .filter(|rel| !present(case_dir, rel))
        .collect();
    CompletenessReport {
        case_dir: case_dir.display().to_string(),
        missing,
    }
}

pub fn check_case_completeness(
    config: &AppConfig,
    case_name: &str,
    required_fields: &[String],
) -> AppResult<CompletenessReport> {
    let case_dir = config.case_dir(case_name);
    if !case_dir.is_dir() {
        return Err(AppError::CaseDirMissing { path: case_dir });
    }
    Ok(case_completeness(&case_dir, required_fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_environments_are_listed() {
        let report = solver_env_with(|name| {
            (name == OPENFOAM_ENV_VAR).then(|| "/opt/openfoam7".to_string())
        });
        assert!(!report.is_ready());
        assert_eq!(report.missing, vec![DEEPFLAME_ENV_VAR.to_string()]);
        assert_eq!(report.openfoam.as_deref(), Some("/opt/openfoam7"));

        let ready = solver_env_with(|_| Some("/opt/x".to_string()));
        assert!(ready.is_ready());
        assert!(!solver_env_with(|_| Some("  ".to_string())).is_ready());
    }

    #[test]
    fn completeness_accepts_gzipped_files() {
        let dir = tempfile::tempdir().unwrap();
        let case = dir.path();
        for rel in ["system/controlDict", "system/fvSchemes", "0/T"] {
            let path = case.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "").unwrap();
        }
        std::fs::create_dir_all(case.join("constant/polyMesh")).unwrap();
        std::fs::write(case.join("constant/polyMesh/boundary.gz"), "").unwrap();

        let fields = vec!["T".to_string(), "U".to_string()];
        let report = case_completeness(case, &fields);
        assert_eq!(report.missing, vec!["system/fvSolution", "0/U"]);
        assert!(!report.is_complete());
    }
}
