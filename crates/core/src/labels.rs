//! Human-readable history labels.

use crate::layer::Layer;
use crate::snapshot::{ShapeType, ToolType};

/// Label for the synthetic entry appended when a previewed snapshot is applied.
pub const APPLIED_LABEL: &str = "Applied snapshot";

pub fn base_layer_label(name: &str) -> String {
    format!("Base layer created: {name}")
}

pub fn created_label(name: &str) -> String {
    format!("Created layer: {name}")
}

pub fn deleted_label(name: &str) -> String {
    format!("Deleted layer: {name}")
}

pub fn renamed_label(new_name: &str) -> String {
    format!("Renamed layer to {new_name}")
}

pub fn opacity_label(name: &str) -> String {
    format!("Changed opacity: {name}")
}

/// Label for a drawing operation, from the tool that produced it.
pub fn tool_label(tool: ToolType, shape: ShapeType) -> String {
    match tool {
        ToolType::Brush => "Brush stroke".to_string(),
        ToolType::Eraser => "Eraser".to_string(),
        ToolType::Line => "Line".to_string(),
        ToolType::Shape => match shape {
            ShapeType::Rectangle => "Shape: rectangle".to_string(),
            ShapeType::Ellipse => "Shape: ellipse".to_string(),
            ShapeType::Triangle => "Shape: triangle".to_string(),
        },
    }
}

/// Directional label for a stacking-order change.
///
/// `before` is the directory as it was when the edit arrived (the moved layer
/// still at its old `z_index`); `moved` carries the new `z_index`.
///
/// - another layer already at the target index: "Swapped M with X"
/// - neighbors on both sides: "Reordered M: Below ↔ Above"
/// - only a neighbor below: "Moved M above Below"
/// - only a neighbor above: "Moved M below Above"
/// - no other layers: "Reordered M"
pub fn reorder_label(moved: &Layer, before: &[Layer]) -> String {
    let target = moved.z_index;
    let others = || before.iter().filter(|l| l.id != moved.id);

    if let Some(swapped) = others().find(|l| l.z_index == target) {
        return format!("Swapped {} with {}", moved.name, swapped.name);
    }

    let below = others()
        .filter(|l| l.z_index < target)
        .max_by_key(|l| l.z_index);
    let above = others()
        .filter(|l| l.z_index > target)
        .min_by_key(|l| l.z_index);

    match (below, above) {
        (Some(b), Some(a)) => format!("Reordered {}: {} ↔ {}", moved.name, b.name, a.name),
        (Some(b), None) => format!("Moved {} above {}", moved.name, b.name),
        (None, Some(a)) => format!("Moved {} below {}", moved.name, a.name),
        (None, None) => format!("Reordered {}", moved.name),
    }
}
