//! Keeping a case's `setFieldsDict` in step with its registry regions.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::registry_service::RegistryService;
use df_project::{Region, ShapeKind};
use df_setfields::InjectReport;
use std::path::PathBuf;

pub fn set_fields_path(config: &AppConfig, case_name: &str) -> PathBuf {
    config
        .case_dir(case_name)
        .join("system")
        .join("setFieldsDict")
}

fn require_dictionary(config: &AppConfig, case_name: &str) -> AppResult<PathBuf> {
    let case_dir = config.case_dir(case_name);
    if !case_dir.is_dir() {
        return Err(AppError::CaseDirMissing { path: case_dir });
    }
    let path = set_fields_path(config, case_name);
    if !path.is_file() {
        return Err(AppError::FileNotFound { path });
    }
    Ok(path)
}

/// Upsert every region recorded for `case_name` into its dictionary.
pub fn inject_case_regions(config: &AppConfig, case_name: &str) -> AppResult<InjectReport> {
    let case = RegistryService::new(config).get_case(case_name)?;
    let path = require_dictionary(config, case_name)?;
    Ok(df_setfields::inject_regions(
        &path,
        case.regions(),
        &config.ignition_field_values,
    )?)
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ZoneSetup {
    pub regions: Vec<Region>,
    pub injection: InjectReport,
}

/// Place one zone per shape in the preset layout for that many zones.
///
/// The layout is built and every resulting block is placed in the case
/// dictionary in memory before the registry is touched; the regions are then
/// appended and the dictionary synced.
pub fn setup_ignition_zones(
    config: &AppConfig,
    case_name: &str,
    shapes: &[ShapeKind],
) -> AppResult<ZoneSetup> {
    let regions = df_setfields::ignition_layout(shapes)?;
    let registry = RegistryService::new(config);
    let case = registry.get_case(case_name)?;
    let path = require_dictionary(config, case_name)?;

    let mut planned = case.regions().to_vec();
    planned.extend(regions.iter().cloned());
    df_setfields::check_regions(&path, &planned, &config.ignition_field_values)?;

    registry.add_regions(case_name, regions.clone())?;
    let injection = inject_case_regions(config, case_name)?;
    Ok(ZoneSetup { regions, injection })
}
