//! Registry and tool input validation.

use crate::region::{RegionShape, validate_region_id};
use crate::schema::Registry;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unsupported region shape: {shape} (expected circle, square or ring)")]
    UnsupportedShape { shape: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid case count: {count} (must be a positive integer)")]
    InvalidCount { count: i64 },
}

pub fn validate_case_count(count: i64) -> Result<usize, ValidationError> {
    if count <= 0 {
        return Err(ValidationError::InvalidCount { count });
    }
    usize::try_from(count).map_err(|_| ValidationError::InvalidCount { count })
}

/// Structural checks on a registry loaded from disk.
pub fn validate_registry(registry: &Registry) -> Result<(), ValidationError> {
    for (name, case) in &registry.run_cases {
        if name.trim().is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ValidationError::InvalidValue {
                field: "run_cases".to_string(),
                value: name.clone(),
                reason: "case names must be usable as a directory name".to_string(),
            });
        }
        if case.case_type.as_str().trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: format!("run_cases.{}.case_type", name),
            });
        }
        for (index, region) in case.regions().iter().enumerate() {
            let context = format!("run_cases.{}.setFieldsDict.regions[{}]", name, index);
            if let Some(id) = &region.id {
                validate_region_id(id).map_err(|_| ValidationError::InvalidValue {
                    field: format!("{}.id", context),
                    value: id.clone(),
                    reason: "invalid region id".to_string(),
                })?;
            }
            if let RegionShape::Circle { radius, .. } | RegionShape::Ring { radius, .. } =
                &region.shape
            {
                if !radius.is_finite() || *radius <= 0.0 {
                    return Err(ValidationError::InvalidValue {
                        field: format!("{}.radius", context),
                        value: radius.to_string(),
                        reason: "must be a positive number".to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}
