//! Cleaning pass applied to a body before it is persisted.

use smol_str::SmolStr;

use crate::block::{Block, DEFAULT_STYLE, ListKind, TextBlock};
use crate::keys::new_key;
use crate::normalize::ListNormalizer;

/// Repair a block sequence so every block satisfies the persisted shape.
///
/// Blocks without a key are dropped. Text blocks have their list attributes
/// reconciled and every span keyed.
pub fn clean_blocks(blocks: Vec<Block>) -> Vec<Block> {
    let before = blocks.len();
    let cleaned: Vec<Block> = blocks
        .into_iter()
        .filter(|block| !block.key().is_empty())
        .map(|block| match block {
            Block::Text(text) => Block::Text(clean_text_block(text)),
            other => other,
        })
        .collect();
    if cleaned.len() != before {
        tracing::debug!(dropped = before - cleaned.len(), "dropped unkeyed blocks");
    }
    cleaned
}

/// Reconcile list attributes and span keys on one text block.
///
/// An explicit `listItem` wins over the legacy convention of naming the list
/// kind in `style`.
pub fn clean_text_block(mut block: TextBlock) -> TextBlock {
    let list_kind: Option<ListKind> = block
        .list_item
        .or_else(|| ListKind::from_legacy_style(&block.style));

    match list_kind {
        Some(kind) => {
            block.list_item = Some(kind);
            block.style = SmolStr::new_static(DEFAULT_STYLE);
            block.level = Some(block.level.unwrap_or(1).max(1));
        }
        None => {
            block.level = None;
        }
    }

    for span in &mut block.children {
        if span.key.is_empty() {
            span.key = new_key();
        }
    }
    block.ensure_span();
    block
}

/// Rewrite expanded image assets to references-by-id.
pub fn image_assets_to_references(blocks: Vec<Block>) -> Vec<Block> {
    blocks
        .into_iter()
        .map(|block| match block {
            Block::Image(mut image) => {
                image.image = image.image.to_reference();
                Block::Image(image)
            }
            other => other,
        })
        .collect()
}

/// The full save-time pipeline: list normalization, cleaning, then image
/// reference rewriting.
pub fn prepare_body(blocks: &[Block]) -> Vec<Block> {
    let normalized = ListNormalizer::new().normalize_blocks(blocks);
    image_assets_to_references(clean_blocks(normalized))
}
