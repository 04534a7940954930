//! Key-addressed operations over a document body.
//!
//! Every operation is total: an unknown key is a silent no-op, reported only
//! through the boolean or `Option` return.

use smol_str::SmolStr;

use crate::block::{Block, ComponentKind, DEFAULT_STYLE, Span, TextBlock};
use crate::keys::new_key_excluding;
use crate::patch::BlockPatch;
use crate::undo::{History, UndoManager};

/// Direction for [`BlockList::move_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

fn with_spans(mut blocks: Vec<Block>) -> Vec<Block> {
    for block in &mut blocks {
        if let Block::Text(text) = block {
            text.ensure_span();
        }
    }
    blocks
}

/// The ordered block sequence being edited, with undo history and the key of
/// the block that should receive focus next.
#[derive(Debug, Clone, Default)]
pub struct BlockList {
    blocks: Vec<Block>,
    history: History<Vec<Block>>,
    pending_focus: Option<SmolStr>,
}

impl BlockList {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks: with_spans(blocks),
            ..Self::default()
        }
    }

    /// A list whose undo history keeps at most `depth` steps.
    pub fn with_history_depth(blocks: Vec<Block>, depth: usize) -> Self {
        Self {
            blocks: with_spans(blocks),
            history: History::new(depth),
            pending_focus: None,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.blocks.iter().position(|block| block.key() == key)
    }

    pub fn get(&self, key: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.key() == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Replace the whole sequence, as one undoable step.
    pub fn replace_all(&mut self, blocks: Vec<Block>) {
        self.history.record(std::mem::replace(&mut self.blocks, blocks));
    }

    /// Merge `patch` into the block with `key`. Order is never changed.
    pub fn update_block(&mut self, key: &str, patch: BlockPatch) -> bool {
        let Some(index) = self.position(key) else {
            return false;
        };
        let mut updated = self.blocks[index].clone();
        if !updated.apply_patch(patch) {
            tracing::debug!(key, "patch does not match block variant");
            return false;
        }
        if updated == self.blocks[index] {
            return false;
        }
        self.history.record(self.blocks.clone());
        self.blocks[index] = updated;
        true
    }

    /// Remove the first block with `key`.
    pub fn delete_block(&mut self, key: &str) -> bool {
        let Some(index) = self.position(key) else {
            return false;
        };
        self.history.record(self.blocks.clone());
        self.blocks.remove(index);
        true
    }

    /// Insert a default block of `kind` after `after_index`, or at the end.
    ///
    /// Non-text blocks are followed by an empty paragraph so the writer
    /// always has somewhere to continue typing. Returns the new block's key.
    pub fn add_component(&mut self, kind: ComponentKind, after_index: Option<usize>) -> SmolStr {
        let mut block = Block::for_kind(kind);
        let key = self.fresh_key();
        block.set_key(key.clone());

        let index = match after_index {
            Some(after) => after.saturating_add(1).min(self.blocks.len()),
            None => self.blocks.len(),
        };

        self.history.record(self.blocks.clone());
        self.blocks.insert(index, block);
        if !kind.is_text() {
            let mut trailing = TextBlock::paragraph();
            trailing.key = self.fresh_key();
            self.blocks.insert(index + 1, Block::Text(trailing));
        }
        tracing::debug!(%kind, index, "added block");
        key
    }

    /// Split the text block with `key` at the caret.
    ///
    /// The block keeps `before`; a new block holding `after` is inserted
    /// right after it and becomes the pending focus. List items split into a
    /// sibling of the same kind and level, anything else into a plain
    /// paragraph. Returns the new block's key.
    pub fn split_block_on_enter(
        &mut self,
        key: &str,
        before: Vec<Span>,
        after: Vec<Span>,
    ) -> Option<SmolStr> {
        let index = self.position(key)?;
        let Block::Text(current) = &self.blocks[index] else {
            return None;
        };

        let mut head = current.clone();
        head.children = before;
        head.ensure_span();

        let mut tail = match (current.list_item, current.level) {
            (Some(kind), level) => TextBlock::list_item(kind, level.unwrap_or(1), after),
            (None, _) => TextBlock::with_spans(DEFAULT_STYLE, after),
        };
        tail.mark_defs = current.mark_defs.clone();
        let new_key = self.fresh_key();
        tail.key = new_key.clone();

        self.history.record(self.blocks.clone());
        self.blocks[index] = Block::Text(head);
        self.blocks.insert(index + 1, Block::Text(tail));
        self.pending_focus = Some(new_key.clone());
        Some(new_key)
    }

    /// Swap the block with `key` with its neighbour.
    pub fn move_block(&mut self, key: &str, direction: Direction) -> bool {
        let Some(index) = self.position(key) else {
            return false;
        };
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.blocks.len() => index + 1,
            _ => return false,
        };
        self.history.record(self.blocks.clone());
        self.blocks.swap(index, target);
        true
    }

    pub fn pending_focus(&self) -> Option<&str> {
        self.pending_focus.as_deref()
    }

    /// Consume the pending focus target, once the caret has moved there.
    pub fn take_pending_focus(&mut self) -> Option<SmolStr> {
        self.pending_focus.take()
    }

    fn fresh_key(&self) -> SmolStr {
        new_key_excluding(|candidate| self.contains_key(candidate))
    }
}

impl UndoManager for BlockList {
    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) -> bool {
        self.pending_focus = None;
        self.history.undo(&mut self.blocks)
    }

    fn redo(&mut self) -> bool {
        self.pending_focus = None;
        self.history.redo(&mut self.blocks)
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ListKind;
    use crate::patch::TextPatch;
    use pretty_assertions::assert_eq;

    fn four_paragraphs() -> BlockList {
        BlockList::new((0..4).map(|i| TextBlock::with_text(DEFAULT_STYLE, format!("p{i}")).into()).collect())
    }

    fn keys(list: &BlockList) -> Vec<String> {
        list.blocks().iter().map(|b| b.key().to_owned()).collect()
    }

    #[test]
    fn test_loaded_text_blocks_get_a_span() {
        let mut bare = TextBlock::with_text(DEFAULT_STYLE, "");
        bare.children.clear();
        let list = BlockList::new(vec![bare.into()]);
        assert_eq!(list.blocks()[0].as_text().unwrap().children.len(), 1);
    }

    #[test]
    fn test_add_divider_after_index() {
        let mut list = four_paragraphs();
        let before = keys(&list);

        let key = list.add_component(ComponentKind::Divider, Some(2));

        assert_eq!(list.len(), 6);
        let after = keys(&list);
        assert_eq!(&after[..3], &before[..3]);
        assert_eq!(after[3], key.as_str());
        assert_eq!(list.blocks()[3].kind(), ComponentKind::Divider);
        assert!(list.blocks()[4].as_text().unwrap().is_empty());
        assert_eq!(after[5], before[3]);
    }

    #[test]
    fn test_add_component_appends_and_clamps() {
        let mut list = four_paragraphs();
        list.add_component(ComponentKind::Paragraph, None);
        assert_eq!(list.len(), 5);

        let key = list.add_component(ComponentKind::Spacer, Some(99));
        assert_eq!(list.len(), 7);
        assert_eq!(list.blocks()[5].key(), key.as_str());
    }

    #[test]
    fn test_delete_absent_key_is_noop() {
        let mut list = four_paragraphs();
        let before = list.blocks().to_vec();
        assert!(!list.delete_block("missing"));
        assert_eq!(list.blocks(), &before[..]);
        assert!(!list.can_undo());
    }

    #[test]
    fn test_delete_removes_block() {
        let mut list = four_paragraphs();
        let key = list.blocks()[1].key().to_owned();
        assert!(list.delete_block(&key));
        assert_eq!(list.len(), 3);
        assert!(!list.contains_key(&key));
    }

    #[test]
    fn test_update_round_trip_leaves_others_untouched() {
        let mut list = four_paragraphs();
        let before = list.blocks().to_vec();
        let key = before[2].key().to_owned();

        let spans = vec![Span::new("changed")];
        assert!(list.update_block(&key, BlockPatch::Text(TextPatch::children(spans.clone()))));

        let updated = list.get(&key).unwrap().as_text().unwrap();
        assert_eq!(updated.children, spans);
        for (i, block) in list.blocks().iter().enumerate() {
            if i != 2 {
                assert_eq!(block, &before[i]);
            }
        }
        assert_eq!(keys(&list), before.iter().map(|b| b.key().to_owned()).collect::<Vec<_>>());
    }

    #[test]
    fn test_update_absent_key_is_noop() {
        let mut list = four_paragraphs();
        assert!(!list.update_block("missing", BlockPatch::Text(TextPatch::style("h1"))));
        assert!(!list.can_undo());
    }

    #[test]
    fn test_split_paragraph() {
        let mut list = four_paragraphs();
        let key = list.blocks()[1].key().to_owned();

        let new_key = list
            .split_block_on_enter(&key, vec![Span::new("hel")], vec![Span::new("lo")])
            .unwrap();

        assert_eq!(list.len(), 5);
        assert_eq!(list.blocks()[1].key(), key);
        assert_eq!(list.blocks()[1].as_text().unwrap().plain_text(), "hel");
        assert_eq!(list.blocks()[2].key(), new_key.as_str());
        assert_eq!(list.blocks()[2].as_text().unwrap().plain_text(), "lo");
        assert_eq!(list.pending_focus(), Some(new_key.as_str()));

        let all = keys(&list);
        assert_eq!(all.iter().filter(|k| **k == new_key.as_str()).count(), 1);

        assert_eq!(list.take_pending_focus(), Some(new_key));
        assert_eq!(list.pending_focus(), None);
    }

    #[test]
    fn test_split_list_item_keeps_kind_and_level() {
        let item = TextBlock::list_item(ListKind::Number, 2, vec![Span::new("ab")]);
        let key = item.key.clone();
        let mut list = BlockList::new(vec![item.into()]);

        list.split_block_on_enter(&key, vec![Span::new("a")], vec![]).unwrap();

        let tail = list.blocks()[1].as_text().unwrap();
        assert_eq!(tail.list_item, Some(ListKind::Number));
        assert_eq!(tail.level, Some(2));
        assert_eq!(tail.children.len(), 1);
    }

    #[test]
    fn test_split_heading_becomes_paragraph() {
        let heading = TextBlock::with_text("h2", "Title");
        let key = heading.key.clone();
        let mut list = BlockList::new(vec![heading.into()]);
        list.split_block_on_enter(&key, vec![Span::new("Title")], vec![]).unwrap();
        assert_eq!(list.blocks()[1].as_text().unwrap().style, DEFAULT_STYLE);
    }

    #[test]
    fn test_split_non_text_is_noop() {
        let mut list = BlockList::default();
        let key = list.add_component(ComponentKind::Divider, None);
        assert_eq!(list.split_block_on_enter(&key, vec![], vec![]), None);
        assert_eq!(list.split_block_on_enter("missing", vec![], vec![]), None);
    }

    #[test]
    fn test_move_block() {
        let mut list = four_paragraphs();
        let original = keys(&list);

        assert!(!list.move_block(&original[0], Direction::Up));
        assert!(!list.move_block(&original[3], Direction::Down));
        assert!(list.move_block(&original[1], Direction::Down));
        assert_eq!(keys(&list), vec![
            original[0].clone(),
            original[2].clone(),
            original[1].clone(),
            original[3].clone(),
        ]);
    }

    #[test]
    fn test_undo_restores_previous_sequence() {
        let mut list = four_paragraphs();
        let original = list.blocks().to_vec();

        list.add_component(ComponentKind::Callout, Some(0));
        let key = list.blocks()[3].key().to_owned();
        list.delete_block(&key);

        assert!(list.undo());
        assert!(list.undo());
        assert_eq!(list.blocks(), &original[..]);
        assert!(!list.undo());

        assert!(list.redo());
        assert_eq!(list.len(), 6);
    }
}
