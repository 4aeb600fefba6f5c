//! Per-shape `topoSetSource` blocks.

use crate::field_values::FieldValueTable;
use df_project::{Region, RegionShape, Vec3};

/// Outer radius of a ring as a multiple of its inner radius.
pub const RING_OUTER_RADIUS_RATIO: f64 = 2.0;

pub(crate) const BLOCK_BEGIN: &str = "// ignition region: ";
pub(crate) const BLOCK_END: &str = "// end ignition region: ";

const INDENT: &str = "    ";

pub(crate) fn begin_marker(id: &str) -> String {
    format!("{BLOCK_BEGIN}{id}")
}

pub(crate) fn end_marker(id: &str) -> String {
    format!("{BLOCK_END}{id}")
}

fn point(p: &Vec3) -> String {
    p.iter()
        .map(|c| format!("{:.8}", c))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render one shape as dictionary lines, indented for the `regions` list.
pub fn render_shape(shape: &RegionShape, field_values: &FieldValueTable) -> Vec<String> {
    let inner = format!("{INDENT}{INDENT}");
    let mut lines = Vec::new();

    match shape {
        RegionShape::Circle { p1, p2, radius } => {
            lines.push(format!("{INDENT}cylinderToCell"));
            lines.push(format!("{INDENT}{{"));
            lines.push(format!("{inner}p1 ({});", point(p1)));
            lines.push(format!("{inner}p2 ({});", point(p2)));
            lines.push(format!("{inner}radius {};", radius));
        }
        RegionShape::Box { p1, p2 } => {
            lines.push(format!("{INDENT}boxToCell"));
            lines.push(format!("{INDENT}{{"));
            lines.push(format!("{inner}boxes"));
            lines.push(format!("{inner}("));
            lines.push(format!("{inner}{INDENT}({})({})", point(p1), point(p2)));
            lines.push(format!("{inner});"));
        }
        RegionShape::Ring { p1, p2, radius } => {
            let outer = radius * RING_OUTER_RADIUS_RATIO;
            lines.push(format!("{INDENT}cylinderAnnulusToCell"));
            lines.push(format!("{INDENT}{{"));
            lines.push(format!("{inner}p1 ({});", point(p1)));
            lines.push(format!("{inner}p2 ({});", point(p2)));
            lines.push(format!("{inner}innerRadius {};", radius));
            lines.push(format!("{inner}outerRadius {};", outer));
        }
    }

    field_values.render_into(&mut lines, &inner);
    lines.push(format!("{INDENT}}}"));
    lines
}

/// Render a region wrapped in begin/end markers carrying its stable id.
pub fn render_region(region: &Region, field_values: &FieldValueTable) -> Vec<String> {
    let id = region.stable_id();
    let mut lines = Vec::new();
    lines.push(format!("{INDENT}{}", begin_marker(&id)));
    lines.extend(render_shape(&region.shape, field_values));
    lines.push(format!("{INDENT}{}", end_marker(&id)));
    lines
}
