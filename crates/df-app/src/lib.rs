//! Shared application service layer for the DeepFlame case tools.
//!
//! Configuration, the locked task registry, case materialization, region
//! injection, script dispatch and result collection. The CLI (and any agent
//! front end) calls the functions in [`tool`], which wrap every outcome in a
//! `{status, ...}` envelope.

pub mod checks;
pub mod collect;
pub mod config;
pub mod error;
pub mod materialize;
pub mod region_service;
pub mod registry_service;
pub mod run_service;
pub mod tool;

pub use checks::{CompletenessReport, SolverEnvReport, check_case_completeness, check_solver_env};
pub use collect::{CollectRequest, CollectResponse, collect_results};
pub use config::{AppConfig, ConfigFile, ROOT_ENV_VAR};
pub use error::{AppError, AppResult, ErrorKind};
pub use materialize::{materialize, materialize_case, materialize_cases};
pub use region_service::{ZoneSetup, inject_case_regions, set_fields_path, setup_ignition_zones};
pub use registry_service::RegistryService;
pub use run_service::{
    ProcessOutput, RunRecord, RunRequest, RunResponse, RunScript, execute_script, list_runs, load_run,
    run_all, run_case, run_in_dir,
};
pub use tool::{ToolResponse, ToolStatus};
