//! Tool entry points returning the `{status, ...}` envelope.
//!
//! Every function here is total: failures come back as an error envelope
//! carrying `error_kind`, `error_message` and, where useful, `details`.

use crate::checks;
use crate::collect::{self, CollectRequest};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult, ErrorKind};
use crate::materialize;
use crate::region_service;
use crate::registry_service::RegistryService;
use crate::run_service::{self, RunRequest, RunScript};
use df_project::{RegionSpec, ShapeKind, ValidationError};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub status: ToolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResponse {
    pub fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: ToolStatus::Success,
            message: Some(message.into()),
            error_kind: None,
            error_message: None,
            details: None,
            data,
        }
    }

    pub fn from_error(err: &AppError) -> Self {
        Self {
            status: ToolStatus::Error,
            message: None,
            error_kind: Some(err.kind()),
            error_message: Some(err.to_string()),
            details: err.details(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            json!({ "status": "error", "error_kind": ErrorKind::Io, "error_message": e.to_string() })
        })
    }

    fn from_result<T: Serialize>(result: AppResult<T>, message: impl FnOnce(&T) -> String) -> Self {
        match result.and_then(|value| {
            let text = message(&value);
            Ok((text, serde_json::to_value(&value)?))
        }) {
            Ok((text, data)) => Self::success(text, Some(data)),
            Err(e) => Self::from_error(&e),
        }
    }

    /// Envelope for a batch: success only if every item succeeded.
    ///
    /// Per-item outcomes are always listed; a failed batch reports the kind of
    /// its first failure.
    fn from_batch<T: Serialize>(verb: &str, outcomes: Vec<(String, AppResult<T>)>) -> Self {
        let total = outcomes.len();
        let mut first_error: Option<ErrorKind> = None;
        let items: Vec<Value> = outcomes
            .into_iter()
            .map(|(case, result)| match result {
                Ok(value) => json!({ "case": case, "status": ToolStatus::Success, "result": value }),
                Err(e) => {
                    first_error.get_or_insert(e.kind());
                    json!({
                        "case": case,
                        "status": ToolStatus::Error,
                        "error_kind": e.kind(),
                        "error_message": e.to_string(),
                        "details": e.details(),
                    })
                }
            })
            .collect();
        let failed = items
            .iter()
            .filter(|item| item["status"] == json!(ToolStatus::Error))
            .count();
        let data = json!({ "total": total, "failed": failed, "cases": items });

        match first_error {
            None => Self::success(format!("{verb} {total} case(s) successfully."), Some(data)),
            Some(kind) => Self {
                status: ToolStatus::Error,
                message: None,
                error_kind: Some(kind),
                error_message: Some(format!("{failed} of {total} case(s) failed.")),
                details: Some(data),
                data: None,
            },
        }
    }
}

/// Load configuration from the environment, as an envelope on failure.
pub fn load_config() -> Result<AppConfig, ToolResponse> {
    AppConfig::from_env().map_err(|e| ToolResponse::from_error(&e))
}

pub fn initialize_registry(config: &AppConfig, case_type: &str, count: i64) -> ToolResponse {
    ToolResponse::from_result(
        RegistryService::new(config).initialize(case_type, count),
        |registry| {
            format!(
                "Task manager initialized successfully with {} case(s).",
                registry.len()
            )
        },
    )
}

pub fn materialize_cases(config: &AppConfig) -> ToolResponse {
    match materialize::materialize_cases(config) {
        Ok(outcomes) => ToolResponse::from_batch("Materialized", outcomes),
        Err(e) => ToolResponse::from_error(&e),
    }
}

/// Accept a raw JSON region description.
pub fn parse_region(region: &Value) -> AppResult<RegionSpec> {
    if region.get("type").is_none() {
        return Err(ValidationError::MissingField {
            field: "type".to_string(),
        }
        .into());
    }
    serde_json::from_value(region.clone()).map_err(|e| {
        AppError::Validation(ValidationError::InvalidValue {
            field: "region".to_string(),
            value: region.to_string(),
            reason: e.to_string(),
        })
    })
}

pub fn add_region(config: &AppConfig, case_name: &str, region: &Value) -> ToolResponse {
    let result = parse_region(region).and_then(|spec| {
        let added = spec.validate()?;
        let regions = RegistryService::new(config).add_regions(case_name, vec![added.clone()])?;
        Ok(json!({
            "region_id": added.stable_id(),
            "regions": regions,
        }))
    });
    ToolResponse::from_result(result, |_| format!("Added region to {case_name}."))
}

pub fn inject_case_regions(config: &AppConfig, case_name: &str) -> ToolResponse {
    ToolResponse::from_result(
        region_service::inject_case_regions(config, case_name),
        |report| {
            format!(
                "Synced {} region(s) into {}.",
                report.regions.len(),
                report.path.display()
            )
        },
    )
}

pub fn setup_ignition_zones(config: &AppConfig, case_name: &str, shapes: &[String]) -> ToolResponse {
    let result = shapes
        .iter()
        .map(|s| s.parse::<ShapeKind>().map_err(AppError::from))
        .collect::<AppResult<Vec<_>>>()
        .and_then(|kinds| region_service::setup_ignition_zones(config, case_name, &kinds));
    ToolResponse::from_result(result, |setup| {
        format!(
            "Placed {} ignition zone(s) in {case_name}.",
            setup.regions.len()
        )
    })
}

pub fn run_case(
    config: &AppConfig,
    case_name: &str,
    script: RunScript,
    timeout: Option<Duration>,
) -> ToolResponse {
    let request = RunRequest {
        case_name,
        script,
        timeout,
    };
    ToolResponse::from_result(run_service::run_case(config, &request), |run| {
        format!("{} finished successfully for {}.", run.script, run.case_name)
    })
}

pub fn run_all(config: &AppConfig, script: RunScript, timeout: Option<Duration>) -> ToolResponse {
    match run_service::run_all(config, script, timeout) {
        Ok(outcomes) => ToolResponse::from_batch("Ran", outcomes),
        Err(e) => ToolResponse::from_error(&e),
    }
}

pub fn list_runs(config: &AppConfig, case_name: &str) -> ToolResponse {
    ToolResponse::from_result(run_service::list_runs(config, case_name), |runs| {
        format!("{} recorded run(s) for {case_name}.", runs.len())
    })
}

/// One recorded dispatch with its logs; the latest when `run_id` is `None`.
pub fn show_run(config: &AppConfig, case_name: &str, run_id: Option<&str>) -> ToolResponse {
    ToolResponse::from_result(run_service::load_run(config, case_name, run_id), |record| {
        format!(
            "Run {} of {case_name}: {:?}.",
            record.manifest.run_id, record.manifest.status
        )
    })
}

pub fn collect_results(config: &AppConfig, case_name: &str, request: &CollectRequest) -> ToolResponse {
    ToolResponse::from_result(
        collect::collect_results(config, case_name, request),
        |collected| {
            format!(
                "Read {} field(s) from {}.",
                collected.table.fields.len(),
                collected.snapshot_dir.display()
            )
        },
    )
}

pub fn show_registry(config: &AppConfig) -> ToolResponse {
    ToolResponse::from_result(RegistryService::new(config).get(), |registry| {
        format!("{} run case(s) registered.", registry.len())
    })
}

pub fn show_case(config: &AppConfig, case_name: &str) -> ToolResponse {
    ToolResponse::from_result(RegistryService::new(config).get_case(case_name), |case| {
        format!("{case_name} ({}) has {} region(s).", case.case_type, case.regions().len())
    })
}

pub fn check_solver_env() -> ToolResponse {
    let report = checks::check_solver_env();
    if report.is_ready() {
        ToolResponse::success(
            "DeepFlame and OpenFOAM environments are loaded.",
            serde_json::to_value(&report).ok(),
        )
    } else {
        let err = AppError::Config {
            message: format!("solver environment not loaded: {} unset", report.missing.join(", ")),
        };
        ToolResponse {
            details: serde_json::to_value(&report).ok(),
            ..ToolResponse::from_error(&err)
        }
    }
}

pub fn check_case_completeness(
    config: &AppConfig,
    case_name: &str,
    required_fields: &[String],
) -> ToolResponse {
    match checks::check_case_completeness(config, case_name, required_fields) {
        Ok(report) if report.is_complete() => ToolResponse::success(
            format!("{case_name} has every required file."),
            serde_json::to_value(&report).ok(),
        ),
        Ok(report) => {
            let err = AppError::FileNotFound {
                path: config.case_dir(case_name),
            };
            ToolResponse {
                error_message: Some(format!(
                    "{case_name} is missing: {}",
                    report.missing.join(", ")
                )),
                details: serde_json::to_value(&report).ok(),
                ..ToolResponse::from_error(&err)
            }
        }
        Err(e) => ToolResponse::from_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_shape() {
        let err = AppError::UnknownCase {
            name: "2D_HIT_9".to_string(),
        };
        let value = ToolResponse::from_error(&err).to_json();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error_kind"], "NotFoundError");
        assert!(value["error_message"].as_str().unwrap().contains("2D_HIT_9"));
        assert!(value.get("message").is_none());
    }

    #[test]
    fn batch_reports_every_item() {
        let outcomes: Vec<(String, AppResult<u32>)> = vec![
            ("a".to_string(), Ok(1)),
            (
                "b".to_string(),
                Err(AppError::TargetExists {
                    path: "/runs/b".into(),
                }),
            ),
        ];
        let response = ToolResponse::from_batch("Materialized", outcomes);
        assert!(!response.is_success());
        assert_eq!(response.error_kind, Some(ErrorKind::AlreadyExists));
        let details = response.details.unwrap();
        assert_eq!(details["failed"], 1);
        assert_eq!(details["cases"][0]["status"], "success");
        assert_eq!(details["cases"][1]["error_kind"], "AlreadyExistsError");
    }

    #[test]
    fn region_without_type_is_a_validation_error() {
        let err = parse_region(&json!({ "p1": [0, 0, 0] })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = parse_region(&json!({ "type": "circle", "radius": "big" })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
