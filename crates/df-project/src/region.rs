//! Ignition zone definitions and their stable identities.

use crate::validate::ValidationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

pub type Vec3 = [f64; 3];

/// Shape tag as written in tool inputs and in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Square,
    Ring,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
            ShapeKind::Ring => "ring",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circle" => Ok(ShapeKind::Circle),
            "square" => Ok(ShapeKind::Square),
            "ring" => Ok(ShapeKind::Ring),
            _ => Err(ValidationError::UnsupportedShape {
                shape: s.to_string(),
            }),
        }
    }
}

/// Geometry of one ignition zone.
///
/// `p1`/`p2` are the cylinder axis ends for circles and rings and the
/// opposite box corners for squares.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RegionShape {
    #[serde(rename = "circle")]
    Circle { p1: Vec3, p2: Vec3, radius: f64 },
    #[serde(rename = "square")]
    Box { p1: Vec3, p2: Vec3 },
    #[serde(rename = "ring")]
    Ring { p1: Vec3, p2: Vec3, radius: f64 },
}

impl RegionShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            RegionShape::Circle { .. } => ShapeKind::Circle,
            RegionShape::Box { .. } => ShapeKind::Square,
            RegionShape::Ring { .. } => ShapeKind::Ring,
        }
    }

    pub fn points(&self) -> (&Vec3, &Vec3) {
        match self {
            RegionShape::Circle { p1, p2, .. }
            | RegionShape::Box { p1, p2 }
            | RegionShape::Ring { p1, p2, .. } => (p1, p2),
        }
    }

    pub fn radius(&self) -> Option<f64> {
        match self {
            RegionShape::Circle { radius, .. } | RegionShape::Ring { radius, .. } => Some(*radius),
            RegionShape::Box { .. } => None,
        }
    }
}

/// An ignition zone owned by one run case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    /// Caller-chosen identity. When absent the identity is derived from the geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub shape: RegionShape,
}

impl Region {
    pub fn new(shape: RegionShape) -> Self {
        Self { id: None, shape }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Identity used to find this region's block in a set-fields dictionary.
    pub fn stable_id(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => geometry_id(&self.shape),
        }
    }
}

/// Content hash of a shape: equal geometry gives equal ids.
pub fn geometry_id(shape: &RegionShape) -> String {
    let mut hasher = Sha256::new();
    let shape_json = serde_json::to_string(shape).unwrap_or_default();
    hasher.update(shape_json.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}-{}", shape.kind(), &digest[..12])
}

/// Region as received from a tool call, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RegionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub p1: Option<Vec<f64>>,
    #[serde(default)]
    pub p2: Option<Vec<f64>>,
    #[serde(default)]
    pub radius: Option<f64>,
}

impl RegionSpec {
    /// Check shape, coordinates and radius, producing a typed region.
    ///
    /// A radius given for a square is ignored.
    pub fn validate(&self) -> Result<Region, ValidationError> {
        let kind: ShapeKind = self.kind.parse()?;
        let p1 = point("p1", self.p1.as_deref())?;
        let p2 = point("p2", self.p2.as_deref())?;

        let shape = match kind {
            ShapeKind::Square => RegionShape::Box { p1, p2 },
            ShapeKind::Circle => RegionShape::Circle {
                p1,
                p2,
                radius: positive_radius(self.radius)?,
            },
            ShapeKind::Ring => RegionShape::Ring {
                p1,
                p2,
                radius: positive_radius(self.radius)?,
            },
        };

        if let Some(id) = &self.id {
            validate_region_id(id)?;
        }

        Ok(Region {
            id: self.id.clone(),
            shape,
        })
    }
}

fn point(field: &str, coords: Option<&[f64]>) -> Result<Vec3, ValidationError> {
    let coords = coords.ok_or_else(|| ValidationError::MissingField {
        field: field.to_string(),
    })?;
    let point: Vec3 = coords
        .try_into()
        .map_err(|_| ValidationError::InvalidValue {
            field: field.to_string(),
            value: format!("{:?}", coords),
            reason: format!("expected 3 coordinates, got {}", coords.len()),
        })?;
    if let Some(bad) = point.iter().find(|c| !c.is_finite()) {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: bad.to_string(),
            reason: "coordinates must be finite".to_string(),
        });
    }
    Ok(point)
}

fn positive_radius(radius: Option<f64>) -> Result<f64, ValidationError> {
    let radius = radius.ok_or_else(|| ValidationError::MissingField {
        field: "radius".to_string(),
    })?;
    if !radius.is_finite() || radius <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "radius".to_string(),
            value: radius.to_string(),
            reason: "must be a positive number".to_string(),
        });
    }
    Ok(radius)
}

/// Ids end up inside dictionary comments, so they must stay on one line.
pub(crate) fn validate_region_id(id: &str) -> Result<(), ValidationError> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: "id".to_string(),
            value: id.to_string(),
            reason: "ids may only contain ASCII letters, digits, '-', '_' and '.'".to_string(),
        })
    }
}
