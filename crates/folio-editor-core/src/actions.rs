//! Editor actions.
//!
//! Platform-agnostic definitions for block-level editing operations. A UI
//! layer translates key presses, toolbar clicks and drag handles into
//! `BlockAction`s and hands them to [`execute_action`](crate::execute::execute_action).

use smol_str::SmolStr;

use crate::block::{ComponentKind, Span};
use crate::blocks::Direction;
use crate::patch::BlockPatch;

/// Semantic block-editing operations.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockAction {
    /// Merge a patch into the block with `key`.
    Update { key: SmolStr, patch: BlockPatch },
    Delete { key: SmolStr },
    /// Insert a block of `kind` after the given index, or append.
    AddComponent {
        kind: ComponentKind,
        after_index: Option<usize>,
    },
    /// Enter pressed inside a text block. The UI supplies the spans on each
    /// side of the caret.
    Split {
        key: SmolStr,
        before: Vec<Span>,
        after: Vec<Span>,
    },
    Move { key: SmolStr, direction: Direction },
    Undo,
    Redo,
}

impl BlockAction {
    /// Key of the block the action targets, if it targets one.
    pub fn target_key(&self) -> Option<&str> {
        match self {
            BlockAction::Update { key, .. }
            | BlockAction::Delete { key }
            | BlockAction::Split { key, .. }
            | BlockAction::Move { key, .. } => Some(key),
            BlockAction::AddComponent { .. } | BlockAction::Undo | BlockAction::Redo => None,
        }
    }
}
