//! Editor snapshots: immutable captures of layers, tool and viewport.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layer::{Layer, SerializedLayer};
use crate::types::ProjectId;

/// Drawing tools. Only the tool identity is captured; stroke settings are not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    #[default]
    Brush,
    Eraser,
    Line,
    Shape,
}

impl ToolType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brush => "brush",
            Self::Eraser => "eraser",
            Self::Line => "line",
            Self::Shape => "shape",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-type of the shape tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Rectangle,
    Ellipse,
    Triangle,
}

impl ShapeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Triangle => "triangle",
        }
    }
}

/// Active tool plus the shape sub-type the shape tool would draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolState {
    pub tool: ToolType,
    pub shape: ShapeType,
}

/// Pan/zoom of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// Serialized capture of the project-relevant editor state.
///
/// Pixel data travels only as the opaque per-layer bitmap references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub project_id: ProjectId,
    pub layers: Vec<SerializedLayer>,
    pub active_tool: ToolType,
    #[serde(default)]
    pub viewport: Viewport,
}

impl EditorSnapshot {
    /// Capture a snapshot from layers already in paint order.
    pub fn capture<'a>(
        project_id: impl Into<ProjectId>,
        ordered_layers: impl IntoIterator<Item = &'a Layer>,
        active_tool: ToolType,
        viewport: Viewport,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            layers: ordered_layers
                .into_iter()
                .map(Layer::to_serialized)
                .collect(),
            active_tool,
            viewport,
        }
    }

    /// Rough memory footprint, dominated by bitmap references.
    pub fn estimated_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self
                .layers
                .iter()
                .map(|l| {
                    std::mem::size_of::<SerializedLayer>()
                        + l.id.len()
                        + l.name.as_ref().map_or(0, String::len)
                        + l.bitmap_ref.as_ref().map_or(0, String::len)
                })
                .sum::<usize>()
    }
}
