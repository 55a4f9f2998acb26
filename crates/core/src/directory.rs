//! In-memory normalized layer collection for the active project.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::layer::{Layer, LayerPatch, SerializedLayer};
use crate::types::{LayerId, ProjectId, Timestamp};

/// Layers of the open project, keyed by id, plus the active-layer selection.
#[derive(Debug, Clone, Default)]
pub struct LayerDirectory {
    project_id: Option<ProjectId>,
    layers: HashMap<LayerId, Layer>,
    active_layer_id: Option<LayerId>,
}

impl LayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Replace the contents with already-persisted layers of `project_id`.
    /// The lowest layer becomes active.
    pub fn load(&mut self, project_id: &str, layers: Vec<Layer>) {
        self.project_id = Some(project_id.to_string());
        self.layers = layers.into_iter().map(|l| (l.id.clone(), l)).collect();
        self.active_layer_id = self.ordered().first().map(|l| l.id.clone());
    }

    /// Wholesale replacement from snapshot layers. Timestamps are fresh and
    /// missing optional fields take their defaults. The first snapshot layer
    /// becomes active, or none when the snapshot is empty.
    pub fn replace_all(
        &mut self,
        project_id: &str,
        layers: &[SerializedLayer],
        now: Timestamp,
    ) -> Vec<Layer> {
        let rebuilt: Vec<Layer> = layers
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, l)| l.into_layer(project_id, i, now))
            .collect();

        self.project_id = Some(project_id.to_string());
        self.active_layer_id = rebuilt.first().map(|l| l.id.clone());
        self.layers = rebuilt.iter().map(|l| (l.id.clone(), l.clone())).collect();
        rebuilt
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in paint order (lowest `z_index` first, ties broken by id).
    pub fn ordered(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.layers.values().collect();
        layers.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        layers
    }

    /// Owned copy of [`ordered`](Self::ordered).
    pub fn ordered_cloned(&self) -> Vec<Layer> {
        self.ordered().into_iter().cloned().collect()
    }

    pub fn snapshot_layers(&self) -> Vec<SerializedLayer> {
        self.ordered()
            .into_iter()
            .map(Layer::to_serialized)
            .collect()
    }

    /// One above the current top layer, or 0 for an empty directory.
    pub fn next_z_index(&self) -> i64 {
        self.layers
            .values()
            .map(|l| l.z_index)
            .max()
            .map_or(0, |z| z + 1)
    }

    pub fn active_layer_id(&self) -> Option<&str> {
        self.active_layer_id.as_deref()
    }

    pub fn set_active(&mut self, id: Option<&str>) -> Result<(), CoreError> {
        if let Some(id) = id {
            if !self.layers.contains_key(id) {
                return Err(CoreError::not_found("layer", id));
            }
        }
        self.active_layer_id = id.map(str::to_string);
        Ok(())
    }

    /// Add a new layer. Ids must be fresh and `z_index` must not collide.
    pub fn insert(&mut self, layer: Layer) -> Result<(), CoreError> {
        if self.layers.contains_key(&layer.id) {
            return Err(CoreError::Conflict(format!(
                "Layer {} already exists",
                layer.id
            )));
        }
        if self.layers.values().any(|l| l.z_index == layer.z_index) {
            return Err(CoreError::Conflict(format!(
                "z-index {} is already taken",
                layer.z_index
            )));
        }
        if self.project_id.is_none() {
            self.project_id = Some(layer.project_id.clone());
        }
        self.layers.insert(layer.id.clone(), layer);
        Ok(())
    }

    /// Apply a patch, returning the layer before and after.
    ///
    /// `z_index` collisions are tolerated here: a two-step swap passes through
    /// a state where both layers share a value.
    pub fn update(
        &mut self,
        id: &str,
        patch: &LayerPatch,
        now: Timestamp,
    ) -> Result<(Layer, Layer), CoreError> {
        let layer = self
            .layers
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("layer", id))?;
        let before = layer.clone();
        layer.apply(patch, now);
        Ok((before, layer.clone()))
    }

    /// Remove a layer. If it was active, the lowest remaining layer becomes
    /// active.
    pub fn remove(&mut self, id: &str) -> Result<Layer, CoreError> {
        let removed = self
            .layers
            .remove(id)
            .ok_or_else(|| CoreError::not_found("layer", id))?;
        if self.active_layer_id.as_deref() == Some(id) {
            self.active_layer_id = self.ordered().first().map(|l| l.id.clone());
        }
        Ok(removed)
    }
}
