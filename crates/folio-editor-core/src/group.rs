//! Read-only grouping of a body into render units.

use crate::block::{Block, ListKind};

/// A run of adjacent list items of one kind, or any other single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockGroup<'a> {
    List { kind: ListKind, items: &'a [Block] },
    Single(&'a Block),
}

/// Group maximal runs of same-kind list items. Every block lands in exactly
/// one group and order is preserved.
pub fn group_blocks(blocks: &[Block]) -> Vec<BlockGroup<'_>> {
    let mut groups = Vec::new();
    let mut index = 0;
    while index < blocks.len() {
        match blocks[index].list_kind() {
            Some(kind) => {
                let run = blocks[index..]
                    .iter()
                    .take_while(|block| block.list_kind() == Some(kind))
                    .count();
                groups.push(BlockGroup::List {
                    kind,
                    items: &blocks[index..index + run],
                });
                index += run;
            }
            None => {
                groups.push(BlockGroup::Single(&blocks[index]));
                index += 1;
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{ComponentKind, Span, TextBlock};

    fn item(kind: ListKind) -> Block {
        TextBlock::list_item(kind, 1, vec![Span::new("x")]).into()
    }

    #[test]
    fn test_groups_adjacent_items_by_kind() {
        let blocks = vec![
            Block::paragraph(),
            item(ListKind::Bullet),
            item(ListKind::Bullet),
            item(ListKind::Number),
            Block::for_kind(ComponentKind::Divider),
            item(ListKind::Bullet),
        ];
        let groups = group_blocks(&blocks);

        let shape: Vec<(Option<ListKind>, usize)> = groups
            .iter()
            .map(|g| match g {
                BlockGroup::List { kind, items } => (Some(*kind), items.len()),
                BlockGroup::Single(_) => (None, 1),
            })
            .collect();
        assert_eq!(
            shape,
            vec![
                (None, 1),
                (Some(ListKind::Bullet), 2),
                (Some(ListKind::Number), 1),
                (None, 1),
                (Some(ListKind::Bullet), 1),
            ]
        );
        let total: usize = shape.iter().map(|(_, n)| n).sum();
        assert_eq!(total, blocks.len());
    }

    #[test]
    fn test_empty_body_has_no_groups() {
        assert!(group_blocks(&[]).is_empty());
    }
}
