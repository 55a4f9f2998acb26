//! Linear snapshot history with a cursor and a preview flag.
//!
//! The stack is append-biased: pushing while the cursor is behind the head
//! discards everything after the cursor (no branching). Navigation moves the
//! cursor and marks the state as a preview until a push confirms it.
//!
//! `HistoryState` is pure and synchronous. Reconciling the layer directory,
//! the store and the canvases with the entry under the cursor is the job of
//! whoever drives it.
//!
//! ```
//! use layerdraw_core::history::{HistoryEntry, HistoryState};
//! # use layerdraw_core::snapshot::{EditorSnapshot, ToolType, Viewport};
//! # let snap = EditorSnapshot { project_id: "p".into(), layers: vec![],
//! #     active_tool: ToolType::Brush, viewport: Viewport::default() };
//! let mut history = HistoryState::new();
//! history.push(HistoryEntry::new("First", snap.clone()));
//! history.push(HistoryEntry::new("Second", snap));
//! history.undo();
//! assert_eq!(history.current_index(), 0);
//! assert!(history.is_preview());
//! ```

use serde::{Deserialize, Serialize};

use crate::snapshot::{EditorSnapshot, ShapeType, ToolType};
use crate::types::{new_id, EntryId, Timestamp};

/// Icon classification shown next to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryIcon {
    Created,
    Deleted,
    Edit,
    Applied,
}

/// One immutable step in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: EntryId,
    /// Human-readable description of the action.
    pub label: String,
    pub state: EditorSnapshot,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_type: Option<ToolType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<ShapeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<HistoryIcon>,
}

impl HistoryEntry {
    pub fn new(label: impl Into<String>, state: EditorSnapshot) -> Self {
        Self {
            id: new_id(),
            label: label.into(),
            state,
            timestamp: crate::types::now(),
            tool_type: None,
            shape_type: None,
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: HistoryIcon) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Tag the entry as produced by a drawing tool. The shape sub-type is only
    /// kept for the shape tool.
    pub fn with_tool(mut self, tool: ToolType, shape: ShapeType) -> Self {
        self.tool_type = Some(tool);
        self.shape_type = (tool == ToolType::Shape).then_some(shape);
        self
    }

    pub fn is_drawing(&self) -> bool {
        self.tool_type.is_some()
    }

    /// Fill in the icon for entries loaded without one: drawing entries keep
    /// no override, everything else shows as an edit.
    pub fn normalized(mut self) -> Self {
        if self.icon.is_none() && !self.is_drawing() {
            self.icon = Some(HistoryIcon::Edit);
        }
        self
    }
}

/// The undo/redo stack.
///
/// Invariant: `-1 <= current_index < stack.len()`, and `current_index == -1`
/// exactly when the stack is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryState {
    stack: Vec<HistoryEntry>,
    current_index: isize,
    is_preview: bool,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryState {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            current_index: -1,
            is_preview: false,
        }
    }

    /// Rebuild from persisted entries (oldest first), cursor on the newest.
    pub fn load(entries: Vec<HistoryEntry>) -> Self {
        let current_index = entries.len() as isize - 1;
        let state = Self {
            stack: entries,
            current_index,
            is_preview: false,
        };
        state.debug_check();
        state
    }

    /// Append an entry after the cursor and move the cursor onto it.
    ///
    /// Entries after the cursor are discarded and returned so callers can
    /// mirror the discard elsewhere. Always leaves preview mode.
    pub fn push(&mut self, entry: HistoryEntry) -> Vec<HistoryEntry> {
        let keep = (self.current_index + 1) as usize;
        let discarded = self.stack.split_off(keep);
        tracing::debug!(
            label = %entry.label,
            discarded = discarded.len(),
            depth = self.stack.len() + 1,
            "History entry pushed"
        );
        self.stack.push(entry);
        self.current_index = self.stack.len() as isize - 1;
        self.is_preview = false;
        self.debug_check();
        discarded
    }

    /// Step the cursor back. Returns whether the cursor moved.
    ///
    /// Preview mode is entered even when already at the oldest entry.
    pub fn undo(&mut self) -> bool {
        let moved = self.current_index > 0;
        if moved {
            self.current_index -= 1;
        }
        self.is_preview = true;
        tracing::debug!(moved, current_index = self.current_index, "Undo");
        self.debug_check();
        moved
    }

    /// Step the cursor forward. Returns whether the cursor moved.
    pub fn redo(&mut self) -> bool {
        let moved = self.current_index < self.stack.len() as isize - 1;
        if moved {
            self.current_index += 1;
        }
        self.is_preview = true;
        tracing::debug!(moved, current_index = self.current_index, "Redo");
        self.debug_check();
        moved
    }

    /// Move the cursor to `index`. Out-of-range targets are ignored.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.stack.len() {
            return false;
        }
        self.current_index = index as isize;
        self.is_preview = true;
        tracing::debug!(current_index = self.current_index, "Jump");
        self.debug_check();
        true
    }

    pub fn set_preview(&mut self, preview: bool) {
        self.is_preview = preview;
    }

    /// Back to the empty initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        usize::try_from(self.current_index)
            .ok()
            .and_then(|i| self.stack.get(i))
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.stack
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Cursor position, `-1` when empty.
    pub fn current_index(&self) -> isize {
        self.current_index
    }

    pub fn is_preview(&self) -> bool {
        self.is_preview
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index < self.stack.len() as isize - 1
    }

    /// Whether the cursor sits on the newest entry.
    pub fn is_at_head(&self) -> bool {
        !self.stack.is_empty() && !self.can_redo()
    }

    fn debug_check(&self) {
        debug_assert!(
            self.current_index >= -1 && self.current_index < self.stack.len() as isize,
            "history cursor {} out of range for {} entries",
            self.current_index,
            self.stack.len()
        );
        debug_assert_eq!(self.stack.is_empty(), self.current_index == -1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
