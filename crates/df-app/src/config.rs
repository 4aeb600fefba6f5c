//! Install-specific settings loaded from `$DF_AGENT_ROOT/config.{yaml,json}`.

use crate::error::{AppError, AppResult};
use df_project::{CaseConfig, CaseType};
use df_setfields::FieldValueTable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ROOT_ENV_VAR: &str = "DF_AGENT_ROOT";
pub const CONFIG_FILE_NAMES: [&str; 3] = ["config.yaml", "config.yml", "config.json"];

fn default_registry_path() -> PathBuf {
    PathBuf::from("output").join(df_project::REGISTRY_FILE_NAME)
}

fn default_runs_dir() -> PathBuf {
    PathBuf::from("output").join("df_runs")
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_run_timeout_s() -> u64 {
    6 * 60 * 60
}

fn default_entry_script() -> String {
    "Allrun".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    10_000
}

/// On-disk configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(rename = "SUPPORTED_CASE_TYPES")]
    pub supported_case_types: Vec<String>,
    /// Extra spellings accepted for a case type, matched case-insensitively.
    #[serde(default)]
    pub case_type_aliases: IndexMap<String, String>,
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,
    #[serde(default = "default_runs_dir")]
    pub runs_dir: PathBuf,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default = "default_run_timeout_s")]
    pub run_timeout_s: u64,
    #[serde(default = "default_entry_script")]
    pub entry_script: String,
    #[serde(default)]
    pub ignition_field_values: Option<FieldValueTable>,
    /// Per-type replacement for the default case configuration.
    #[serde(default)]
    pub case_defaults: IndexMap<String, CaseConfig>,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl ConfigFile {
    /// Configuration with defaults for everything but the supported types.
    pub fn new<I, S>(supported_case_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            supported_case_types: supported_case_types.into_iter().map(Into::into).collect(),
            case_type_aliases: IndexMap::new(),
            registry_path: default_registry_path(),
            runs_dir: default_runs_dir(),
            templates_dir: default_templates_dir(),
            shell: default_shell(),
            run_timeout_s: default_run_timeout_s(),
            entry_script: default_entry_script(),
            ignition_field_values: None,
            case_defaults: IndexMap::new(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }

    pub fn parse(path: &Path, content: &str) -> AppResult<Self> {
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let parsed = if is_json {
            serde_json::from_str(content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(content).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| AppError::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
        })
    }
}

/// Resolved configuration: every path is absolute under the root.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub root: PathBuf,
    pub supported_case_types: Vec<CaseType>,
    pub case_type_aliases: IndexMap<String, String>,
    pub registry_path: PathBuf,
    pub runs_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub shell: String,
    pub run_timeout: Duration,
    pub entry_script: String,
    pub ignition_field_values: FieldValueTable,
    pub case_defaults: IndexMap<String, CaseConfig>,
    pub lock_timeout: Duration,
}

impl AppConfig {
    /// Load from the directory named by `DF_AGENT_ROOT`.
    pub fn from_env() -> AppResult<Self> {
        let root = std::env::var_os(ROOT_ENV_VAR)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Config {
                message: format!("{} environment variable is not set", ROOT_ENV_VAR),
            })?;
        Self::load(Path::new(&root))
    }

    /// Load the first config file found in `root`.
    pub fn load(root: &Path) -> AppResult<Self> {
        let path = CONFIG_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| AppError::Config {
                message: format!("no config.yaml or config.json in {}", root.display()),
            })?;
        let content = std::fs::read_to_string(&path)?;
        let file = ConfigFile::parse(&path, &content)?;
        Ok(Self::with_root(root, file))
    }

    pub fn with_root(root: &Path, file: ConfigFile) -> Self {
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { root.join(p) };
        Self {
            root: root.to_path_buf(),
            supported_case_types: file
                .supported_case_types
                .iter()
                .map(|t| CaseType::new(t.trim()))
                .collect(),
            case_type_aliases: file.case_type_aliases,
            registry_path: resolve(file.registry_path),
            runs_dir: resolve(file.runs_dir),
            templates_dir: resolve(file.templates_dir),
            shell: file.shell,
            run_timeout: Duration::from_secs(file.run_timeout_s),
            entry_script: file.entry_script,
            ignition_field_values: file.ignition_field_values.unwrap_or_default(),
            case_defaults: file.case_defaults,
            lock_timeout: Duration::from_millis(file.lock_timeout_ms),
        }
    }

    pub fn is_supported(&self, case_type: &CaseType) -> bool {
        self.supported_case_types.contains(case_type)
    }

    /// Resolve a user phrase such as `hit` or `二维HIT` to a supported type.
    ///
    /// Exact matches win, then a case-insensitive match, then the alias map.
    /// Unknown phrases come back unchanged so the caller reports them as given.
    pub fn normalize_case_type(&self, input: &str) -> CaseType {
        let input = input.trim();
        if let Some(t) = self.supported_case_types.iter().find(|t| t.as_str() == input) {
            return t.clone();
        }
        let folded = input.to_lowercase();
        if let Some(t) = self
            .supported_case_types
            .iter()
            .find(|t| t.as_str().to_lowercase() == folded)
        {
            return t.clone();
        }
        self.case_type_aliases
            .iter()
            .find(|(alias, _)| alias.to_lowercase() == folded)
            .map(|(_, target)| CaseType::new(target.as_str()))
            .unwrap_or_else(|| CaseType::new(input))
    }

    /// Default configuration for a new case of `case_type`.
    pub fn case_defaults(&self, case_type: &CaseType) -> CaseConfig {
        self.case_defaults
            .get(case_type.as_str())
            .cloned()
            .unwrap_or_default()
    }

    pub fn template_dir(&self, case_type: &CaseType) -> PathBuf {
        self.templates_dir.join(case_type.as_str())
    }

    pub fn case_dir(&self, case_name: &str) -> PathBuf {
        self.runs_dir.join(case_name)
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .registry_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| df_project::REGISTRY_FILE_NAME.into());
        name.push(".lock");
        self.registry_path.with_file_name(name)
    }
}
