//! Action execution for block lists.

use crate::actions::BlockAction;
use crate::blocks::BlockList;
use crate::undo::UndoManager;

/// Execute an editor action on a block list.
///
/// This is the central dispatch point for block operations.
/// Returns true if the action was handled and the list was modified.
pub fn execute_action(list: &mut BlockList, action: &BlockAction) -> bool {
    let changed = match action {
        BlockAction::Update { key, patch } => list.update_block(key, patch.clone()),
        BlockAction::Delete { key } => list.delete_block(key),
        BlockAction::AddComponent { kind, after_index } => {
            list.add_component(*kind, *after_index);
            true
        }
        BlockAction::Split { key, before, after } => list
            .split_block_on_enter(key, before.clone(), after.clone())
            .is_some(),
        BlockAction::Move { key, direction } => list.move_block(key, *direction),
        BlockAction::Undo => list.undo(),
        BlockAction::Redo => list.redo(),
    };
    if !changed {
        tracing::trace!(?action, "action left block list unchanged");
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, ComponentKind, Span};
    use crate::blocks::Direction;
    use crate::patch::{BlockPatch, TextPatch};

    #[test]
    fn test_dispatch_edits_and_history() {
        let mut list = BlockList::new(vec![Block::paragraph()]);
        let first = smol_str::SmolStr::from(list.blocks()[0].key());

        assert!(execute_action(
            &mut list,
            &BlockAction::AddComponent {
                kind: ComponentKind::Button,
                after_index: Some(0),
            }
        ));
        assert_eq!(list.len(), 3);

        assert!(execute_action(
            &mut list,
            &BlockAction::Move {
                key: first,
                direction: Direction::Down,
            }
        ));
        assert_eq!(list.blocks()[0].kind(), ComponentKind::Button);

        assert!(execute_action(&mut list, &BlockAction::Undo));
        assert_eq!(list.blocks()[0].kind(), ComponentKind::Paragraph);
        assert!(execute_action(&mut list, &BlockAction::Redo));
        assert!(!execute_action(&mut list, &BlockAction::Redo));
    }

    #[test]
    fn test_unknown_keys_report_no_change() {
        let mut list = BlockList::new(vec![Block::paragraph()]);
        let actions = [
            BlockAction::Delete { key: "nope".into() },
            BlockAction::Update {
                key: "nope".into(),
                patch: BlockPatch::Text(TextPatch::children(vec![Span::new("x")])),
            },
            BlockAction::Split {
                key: "nope".into(),
                before: vec![],
                after: vec![],
            },
            BlockAction::Move {
                key: "nope".into(),
                direction: Direction::Up,
            },
        ];
        for action in &actions {
            assert_eq!(action.target_key(), Some("nope"));
            assert!(!execute_action(&mut list, action));
        }
        assert_eq!(list.len(), 1);
    }
}
