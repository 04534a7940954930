//! Typed partial updates for blocks.
//!
//! A patch names only the fields it changes. Merging happens in
//! [`Block::apply_patch`], which keeps block invariants (at least one span,
//! list items at the default style) regardless of what the caller sends.

use smol_str::SmolStr;

use crate::block::{Block, Component, DEFAULT_STYLE, ImageValue, ListKind, MarkDef, Span};

/// Partial update for a [`TextBlock`](crate::block::TextBlock).
///
/// `list_item` and `level` are doubly optional: `None` leaves the field alone,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextPatch {
    pub style: Option<SmolStr>,
    pub children: Option<Vec<Span>>,
    pub list_item: Option<Option<ListKind>>,
    pub level: Option<Option<u32>>,
    pub mark_defs: Option<Vec<MarkDef>>,
}

impl TextPatch {
    pub fn children(children: Vec<Span>) -> Self {
        Self {
            children: Some(children),
            ..Self::default()
        }
    }

    pub fn style(style: impl Into<SmolStr>) -> Self {
        Self {
            style: Some(style.into()),
            ..Self::default()
        }
    }
}

/// Partial update for an image block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagePatch {
    pub image: Option<ImageValue>,
    pub alt: Option<Option<String>>,
    pub caption: Option<Option<String>>,
}

/// Partial update addressed to one block variant.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockPatch {
    Text(TextPatch),
    Image(ImagePatch),
    /// Replaces the component payload. The kind may not change.
    Component(Component),
}

impl Block {
    /// Merge `patch` into this block. Returns false, leaving the block as it
    /// was, when the patch targets a different variant or component kind.
    pub fn apply_patch(&mut self, patch: BlockPatch) -> bool {
        match (self, patch) {
            (Block::Text(block), BlockPatch::Text(patch)) => {
                if let Some(style) = patch.style {
                    block.style = style;
                }
                if let Some(children) = patch.children {
                    block.children = children;
                }
                if let Some(list_item) = patch.list_item {
                    block.list_item = list_item;
                }
                if let Some(level) = patch.level {
                    block.level = level;
                }
                if let Some(mark_defs) = patch.mark_defs {
                    block.mark_defs = mark_defs;
                }
                block.ensure_span();
                if block.list_item.is_some() {
                    block.style = SmolStr::new_static(DEFAULT_STYLE);
                    block.level.get_or_insert(1);
                }
                true
            }
            (Block::Image(block), BlockPatch::Image(patch)) => {
                if let Some(image) = patch.image {
                    block.image = image;
                }
                if let Some(alt) = patch.alt {
                    block.image.alt = alt;
                }
                if let Some(caption) = patch.caption {
                    block.image.caption = caption;
                }
                true
            }
            (Block::Component(block), BlockPatch::Component(component)) => {
                if block.component.kind() != component.kind() {
                    return false;
                }
                block.component = component;
                true
            }
            _ => false,
        }
    }
}
