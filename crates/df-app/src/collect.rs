//! Reading scalar results back out of a case.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::registry_service::RegistryService;
use df_results::ScalarTable;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct CollectRequest {
    pub fields: Vec<String>,
    /// Time directory name such as `0.0003`; latest when `None`.
    pub time: Option<String>,
    /// Where to write the table as CSV.
    pub csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectResponse {
    pub case_name: String,
    pub snapshot_dir: PathBuf,
    pub row_count: usize,
    pub table: ScalarTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

pub fn collect_results(
    config: &AppConfig,
    case_name: &str,
    request: &CollectRequest,
) -> AppResult<CollectResponse> {
    RegistryService::new(config).get_case(case_name)?;
    let case_dir = config.case_dir(case_name);
    if !case_dir.is_dir() {
        return Err(AppError::CaseDirMissing { path: case_dir });
    }

    let snapshot_dir = match &request.time {
        Some(time) => {
            let dir = case_dir.join(time);
            if !dir.is_dir() {
                return Err(AppError::FileNotFound { path: dir });
            }
            dir
        }
        None => df_results::latest_time_dir(&case_dir)?,
    };

    let table = df_results::read_scalar_series(&snapshot_dir, &request.fields)?;
    let csv_path = match &request.csv {
        Some(path) => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                config.root.join(path)
            };
            table.write_csv(&path)?;
            Some(path)
        }
        None => None,
    };

    info!(
        case = case_name,
        snapshot = %snapshot_dir.display(),
        fields = table.fields.len(),
        rows = table.row_count(),
        "collected scalar fields"
    );
    Ok(CollectResponse {
        case_name: case_name.to_string(),
        snapshot_dir,
        row_count: table.row_count(),
        table,
        csv_path,
    })
}
