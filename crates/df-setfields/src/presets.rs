//! Preset ignition zone layouts for the 2D HIT domain.
//!
//! The domain is a 0.0503 m square slab; zones span its full depth.

use crate::{SetFieldsError, SetFieldsResult};
use df_project::{Region, RegionShape, ShapeKind};

const DOMAIN_DEPTH: f64 = 0.050265482;

/// Placement of one zone within a layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IgnitionSlot {
    pub center: [f64; 2],
    /// Cylinder radius for circles, inner radius for rings.
    pub radius: f64,
    /// Half edge length for squares.
    pub half_width: f64,
}

impl IgnitionSlot {
    const fn new(x: f64, y: f64, radius: f64, half_width: f64) -> Self {
        Self {
            center: [x, y],
            radius,
            half_width,
        }
    }

    /// Geometry of `kind` placed in this slot.
    pub fn shape(&self, kind: ShapeKind) -> RegionShape {
        let [x, y] = self.center;
        match kind {
            ShapeKind::Circle => RegionShape::Circle {
                p1: [x, y, 0.0],
                p2: [x, y, DOMAIN_DEPTH],
                radius: self.radius,
            },
            ShapeKind::Ring => RegionShape::Ring {
                p1: [x, y, 0.0],
                p2: [x, y, DOMAIN_DEPTH],
                radius: self.radius,
            },
            ShapeKind::Square => RegionShape::Box {
                p1: [x - self.half_width, y - self.half_width, 0.0],
                p2: [x + self.half_width, y + self.half_width, DOMAIN_DEPTH],
            },
        }
    }
}

const TWO_ZONES: [IgnitionSlot; 2] = [
    IgnitionSlot::new(0.016755160, 0.025132741, 0.00102604, 0.00102604),
    IgnitionSlot::new(0.033510322, 0.025132741, 0.00102604, 0.00102604),
];

const THREE_ZONES: [IgnitionSlot; 3] = [
    IgnitionSlot::new(0.016755160, 0.020295942, 0.00102604, 0.0013),
    IgnitionSlot::new(0.025132741, 0.034806338, 0.00102604, 0.0013),
    IgnitionSlot::new(0.033510322, 0.020295942, 0.00102604, 0.0013),
];

const FOUR_ZONES: [IgnitionSlot; 4] = [
    IgnitionSlot::new(0.016755160, 0.016755160, 0.001256637, 0.001256637),
    IgnitionSlot::new(0.016755160, 0.033510322, 0.001256637, 0.001256637),
    IgnitionSlot::new(0.033510322, 0.016755160, 0.001256637, 0.001256637),
    IgnitionSlot::new(0.033510322, 0.033510322, 0.001256637, 0.001256637),
];

pub fn slots(count: usize) -> Option<&'static [IgnitionSlot]> {
    match count {
        2 => Some(&TWO_ZONES),
        3 => Some(&THREE_ZONES),
        4 => Some(&FOUR_ZONES),
        _ => None,
    }
}

/// One region per requested shape, placed in the layout for that many zones.
///
/// Regions get ids `ignition-{count}-{slot}` so re-running a layout replaces
/// its blocks.
pub fn ignition_layout(shapes: &[ShapeKind]) -> SetFieldsResult<Vec<Region>> {
    let layout = slots(shapes.len()).ok_or(SetFieldsError::UnsupportedLayout {
        count: shapes.len(),
    })?;
    Ok(layout
        .iter()
        .zip(shapes)
        .enumerate()
        .map(|(i, (slot, kind))| {
            Region::new(slot.shape(*kind)).with_id(format!("ignition-{}-{}", shapes.len(), i + 1))
        })
        .collect())
}
