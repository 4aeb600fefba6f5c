//! Task registry schema definitions.

use crate::region::Region;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default file name of the persisted registry.
pub const REGISTRY_FILE_NAME: &str = "task_manager.json";

/// Persisted mapping from case name to its type and configuration.
///
/// Cases keep their insertion order so `2D_HIT_10` follows `2D_HIT_9`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Registry {
    #[serde(default)]
    pub run_cases: IndexMap<String, RunCase>,
}

impl Registry {
    /// Build `count` cases named `{case_type}_{1..=count}`, each with a copy of `defaults`.
    pub fn with_cases(case_type: &CaseType, count: usize, defaults: &CaseConfig) -> Self {
        let run_cases = (1..=count)
            .map(|index| {
                (
                    case_name(case_type, index),
                    RunCase {
                        case_type: case_type.clone(),
                        case_config: defaults.clone(),
                    },
                )
            })
            .collect();
        Self { run_cases }
    }

    pub fn case(&self, name: &str) -> Option<&RunCase> {
        self.run_cases.get(name)
    }

    pub fn case_mut(&mut self, name: &str) -> Option<&mut RunCase> {
        self.run_cases.get_mut(name)
    }

    pub fn case_names(&self) -> Vec<&str> {
        self.run_cases.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.run_cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.run_cases.is_empty()
    }
}

/// Name of the `index`-th (1-based) case of a type.
pub fn case_name(case_type: &CaseType, index: usize) -> String {
    format!("{}_{}", case_type, index)
}

/// One simulation instance tracked by the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunCase {
    pub case_type: CaseType,
    pub case_config: CaseConfig,
}

impl RunCase {
    pub fn regions(&self) -> &[Region] {
        &self.case_config.set_fields.regions
    }
}

/// Template/config schema tag such as `2D_HIT`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CaseType(String);

impl CaseType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CaseConfig {
    #[serde(default)]
    pub fuel: FuelConfig,
    #[serde(rename = "blockMeshDict", default)]
    pub block_mesh: BlockMeshConfig,
    #[serde(rename = "setFieldsDict", default)]
    pub set_fields: SetFieldsConfig,
    #[serde(rename = "controlDict", default)]
    pub control: ControlConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelConfig {
    pub fuel: String,
    pub equiv_ratio: f64,
    /// Unburnt temperature in K.
    pub temperature: f64,
    /// Pressure in atm.
    pub pressure: f64,
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            fuel: "H2".to_string(),
            equiv_ratio: 1.0,
            temperature: 600.0,
            pressure: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockMeshConfig {
    pub cells_per_direction: Vec<u32>,
    /// Domain extent per direction in m.
    pub domain_size: Vec<f64>,
}

impl Default for BlockMeshConfig {
    fn default() -> Self {
        Self {
            cells_per_direction: vec![1024, 1024],
            domain_size: vec![0.05, 0.05],
        }
    }
}

/// Ignition zones, in the order they were added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SetFieldsConfig {
    #[serde(default)]
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlConfig {
    #[serde(rename = "endTime")]
    pub end_time: f64,
    #[serde(rename = "deltaT")]
    pub delta_t: f64,
    #[serde(rename = "writeInterval")]
    pub write_interval: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            end_time: 3.0e-4,
            delta_t: 1.0e-6,
            write_interval: 1.0e-5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_names_follow_type_and_index() {
        let case_type = CaseType::new("2D_HIT");
        let registry = Registry::with_cases(&case_type, 3, &CaseConfig::default());
        assert_eq!(registry.case_names(), vec!["2D_HIT_1", "2D_HIT_2", "2D_HIT_3"]);
    }

    #[test]
    fn insertion_order_survives_double_digit_names() {
        let case_type = CaseType::new("2D_HIT");
        let registry = Registry::with_cases(&case_type, 11, &CaseConfig::default());
        let json = serde_json::to_string(&registry).unwrap();
        let loaded: Registry = serde_json::from_str(&json).unwrap();
        let names = loaded.case_names();
        assert_eq!(names[8], "2D_HIT_9");
        assert_eq!(names[9], "2D_HIT_10");
    }

    #[test]
    fn config_uses_dictionary_key_names() {
        let value = serde_json::to_value(CaseConfig::default()).unwrap();
        assert!(value.get("blockMeshDict").is_some());
        assert!(value.get("setFieldsDict").is_some());
        assert_eq!(value["controlDict"]["deltaT"], serde_json::json!(1.0e-6));
        assert_eq!(value["fuel"]["fuel"], "H2");
        assert_eq!(value["setFieldsDict"]["regions"], serde_json::json!([]));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: CaseConfig =
            serde_json::from_str(r#"{"controlDict": {"endTime": 1e-3, "deltaT": 1e-6, "writeInterval": 1e-4}}"#)
                .unwrap();
        assert_eq!(config.fuel, FuelConfig::default());
        assert_eq!(config.control.end_time, 1e-3);
        assert!(config.set_fields.regions.is_empty());
    }
}
