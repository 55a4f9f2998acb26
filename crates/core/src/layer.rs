//! Layer records and the patch/create DTOs that mutate them.
//!
//! A [`Layer`] is the normalized, persisted form (one row per layer in the
//! `layers` table). A [`SerializedLayer`] is the reduced form captured inside
//! an [`EditorSnapshot`](crate::snapshot::EditorSnapshot); project ownership
//! and timestamps are reconstructed when a snapshot is applied.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{LayerId, ProjectId, Timestamp};

/// Maximum length of a layer name, in characters.
pub const MAX_LAYER_NAME_LEN: usize = 100;

/// Name given to the layer auto-created for an empty project.
pub const BASE_LAYER_NAME: &str = "Layer 1";

// ---------------------------------------------------------------------------
// Layer
// ---------------------------------------------------------------------------

/// A raster layer belonging to one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub project_id: ProjectId,
    pub name: String,
    pub visible: bool,
    /// In `[0, 1]`.
    pub opacity: f64,
    /// Relative order defines paint order; values need not be contiguous.
    pub z_index: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: Timestamp,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: Timestamp,
    /// Encoded bitmap (data URL). Empty when nothing has been drawn.
    #[serde(default)]
    pub bitmap_ref: String,
}

impl Layer {
    /// Build a new layer from a create DTO.
    pub fn new(
        id: LayerId,
        project_id: ProjectId,
        input: NewLayer,
        default_z_index: i64,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            project_id,
            name: input.name,
            visible: input.visible.unwrap_or(true),
            opacity: input.opacity.unwrap_or(1.0),
            z_index: input.z_index.unwrap_or(default_z_index),
            created_at: now,
            updated_at: now,
            bitmap_ref: input.bitmap_ref.unwrap_or_default(),
        }
    }

    /// Whether this layer carries drawn pixels.
    pub fn has_bitmap(&self) -> bool {
        !self.bitmap_ref.is_empty()
    }

    /// Apply a validated patch in place, bumping `updated_at`.
    pub fn apply(&mut self, patch: &LayerPatch, now: Timestamp) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity;
        }
        if let Some(z_index) = patch.z_index {
            self.z_index = z_index;
        }
        if let Some(bitmap_ref) = &patch.bitmap_ref {
            self.bitmap_ref = bitmap_ref.clone();
        }
        self.updated_at = now;
    }

    /// Capture the snapshot form of this layer.
    pub fn to_serialized(&self) -> SerializedLayer {
        SerializedLayer {
            id: self.id.clone(),
            name: Some(self.name.clone()),
            visible: Some(self.visible),
            opacity: Some(self.opacity),
            z_index: self.z_index,
            bitmap_ref: if self.has_bitmap() {
                Some(self.bitmap_ref.clone())
            } else {
                None
            },
        }
    }
}

// ---------------------------------------------------------------------------
// SerializedLayer
// ---------------------------------------------------------------------------

/// The subset of [`Layer`] captured inside a snapshot.
///
/// Optional fields are tolerated on read so that snapshots written by older
/// clients still apply; defaults are filled in by [`SerializedLayer::into_layer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedLayer {
    pub id: LayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    pub z_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitmap_ref: Option<String>,
}

impl SerializedLayer {
    /// Rebuild a full layer record. `position` is the layer's index in the
    /// snapshot and only feeds the placeholder name.
    pub fn into_layer(self, project_id: &str, position: usize, now: Timestamp) -> Layer {
        Layer {
            id: self.id,
            project_id: project_id.to_string(),
            name: self
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| placeholder_name(position)),
            visible: self.visible.unwrap_or(true),
            opacity: self.opacity.unwrap_or(1.0),
            z_index: self.z_index,
            created_at: now,
            updated_at: now,
            bitmap_ref: self.bitmap_ref.unwrap_or_default(),
        }
    }

    /// The bitmap reference, if one is present and non-empty.
    pub fn bitmap(&self) -> Option<&str> {
        self.bitmap_ref.as_deref().filter(|b| !b.is_empty())
    }
}

/// Positional placeholder name, 1-based.
pub fn placeholder_name(position: usize) -> String {
    format!("Layer {}", position + 1)
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// DTO for creating a layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLayer {
    pub name: String,
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
    /// Defaults to one above the current top layer.
    pub z_index: Option<i64>,
    pub bitmap_ref: Option<String>,
}

impl NewLayer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name(&self.name)?;
        if let Some(opacity) = self.opacity {
            validate_opacity(opacity)?;
        }
        Ok(())
    }
}

/// DTO for a partial layer update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPatch {
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub opacity: Option<f64>,
    pub z_index: Option<i64>,
    pub bitmap_ref: Option<String>,
}

/// How a patch changes a layer, as far as history recording is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// The bitmap changed: the user drew something.
    Drawing,
    /// Stacking order changed.
    ZIndex,
    /// Name changed.
    Rename,
    /// Opacity changed.
    Opacity,
    /// Only visibility changed.
    VisibilityOnly,
    /// Nothing observable changed.
    Unchanged,
}

impl LayerPatch {
    pub fn bitmap(bitmap_ref: impl Into<String>) -> Self {
        Self {
            bitmap_ref: Some(bitmap_ref.into()),
            ..Self::default()
        }
    }

    pub fn opacity(opacity: f64) -> Self {
        Self {
            opacity: Some(opacity),
            ..Self::default()
        }
    }

    pub fn visibility(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            ..Self::default()
        }
    }

    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn z_index(z_index: i64) -> Self {
        Self {
            z_index: Some(z_index),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(opacity) = self.opacity {
            validate_opacity(opacity)?;
        }
        Ok(())
    }

    /// Classify this patch against the layer it is about to modify.
    ///
    /// A bitmap change dominates; among metadata changes the stacking order
    /// wins over a rename, which wins over opacity.
    pub fn classify(&self, before: &Layer) -> UpdateKind {
        let changed = |new: Option<bool>| new.unwrap_or(false);

        if changed(self.bitmap_ref.as_ref().map(|b| *b != before.bitmap_ref)) {
            return UpdateKind::Drawing;
        }
        if changed(self.z_index.map(|z| z != before.z_index)) {
            return UpdateKind::ZIndex;
        }
        if changed(self.name.as_ref().map(|n| *n != before.name)) {
            return UpdateKind::Rename;
        }
        if changed(self.opacity.map(|o| o != before.opacity)) {
            return UpdateKind::Opacity;
        }
        if changed(self.visible.map(|v| v != before.visible)) {
            return UpdateKind::VisibilityOnly;
        }
        UpdateKind::Unchanged
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Layer name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_LAYER_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Layer name must be at most {MAX_LAYER_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_opacity(opacity: f64) -> Result<(), CoreError> {
    if (0.0..=1.0).contains(&opacity) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Opacity must be within [0, 1], got {opacity}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
