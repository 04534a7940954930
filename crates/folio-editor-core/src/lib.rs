//! folio-editor-core: block editor logic without UI or store dependencies.
//!
//! This crate provides:
//! - `Block` and friends - the portable rich-text block model
//! - `BlockList` - key-addressed editing with undo history
//! - `ListNormalizer` and the save-time cleaning pass
//! - `slugify` / `SlugTracker` - slug derivation from titles

pub mod actions;
pub mod block;
pub mod blocks;
pub mod clean;
pub mod error;
pub mod execute;
pub mod group;
pub mod keys;
pub mod normalize;
pub mod patch;
pub mod slug;
pub mod undo;

pub use actions::BlockAction;
pub use block::{
    Asset, AssetReference, AssetSlot, Block, Component, ComponentBlock, ComponentKind,
    DEFAULT_STYLE, ImageBlock, ImageValue, ListKind, MarkDef, Span, TextBlock,
};
pub use blocks::{BlockList, Direction};
pub use clean::{clean_blocks, prepare_body};
pub use error::UnknownComponentKind;
pub use execute::execute_action;
pub use group::{BlockGroup, group_blocks};
pub use keys::new_key;
pub use normalize::{ListNormalizer, normalize_blocks};
pub use patch::{BlockPatch, ImagePatch, TextPatch};
pub use slug::{SlugTracker, slugify};
pub use smol_str::SmolStr;
pub use undo::{History, UndoManager};
