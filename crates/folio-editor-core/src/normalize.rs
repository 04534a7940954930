//! Conversion of pasted list markup into structured list-item blocks.
//!
//! When rich text containing a list is pasted into a paragraph, the editor
//! stores the list's HTML between sentinel markers inside the paragraph's
//! text. Before saving, [`ListNormalizer`] replaces such a paragraph with one
//! list-item block per `<li>`.
//!
//! Anything unexpected (no sentinel pair, no list element) leaves the block
//! exactly as it was.

use std::collections::HashMap;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use smol_str::SmolStr;

use crate::block::{Block, ListKind, MarkDef, Span, TextBlock, decorator};
use crate::keys::new_key;

/// Delimits bullet-list markup inside span text.
pub const BULLET_SENTINEL: &str = "__LIST_HTML_UL__";
/// Delimits numbered-list markup inside span text.
pub const NUMBER_SENTINEL: &str = "__LIST_HTML_OL__";

/// Normalizes blocks for one save operation.
///
/// Link mark definitions get one key per distinct href for the lifetime of
/// the normalizer, so the same URL shares a definition everywhere it is used
/// within a save.
#[derive(Debug, Default)]
pub struct ListNormalizer {
    link_keys: HashMap<String, SmolStr>,
}

impl ListNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize every block in order.
    pub fn normalize_blocks(&mut self, blocks: &[Block]) -> Vec<Block> {
        blocks
            .iter()
            .flat_map(|block| self.normalize_block(block))
            .collect()
    }

    /// Normalize one block into zero or more blocks.
    pub fn normalize_block(&mut self, block: &Block) -> Vec<Block> {
        let Block::Text(text_block) = block else {
            return vec![block.clone()];
        };
        match self.expand_list_markup(text_block) {
            Some(items) => {
                tracing::debug!(
                    key = %text_block.key,
                    items = items.len(),
                    "expanded pasted list markup"
                );
                items.into_iter().map(Block::Text).collect()
            }
            None => vec![block.clone()],
        }
    }

    fn expand_list_markup(&mut self, block: &TextBlock) -> Option<Vec<TextBlock>> {
        let text = block.plain_text();
        let markup = sentinel_contents(&text)?;

        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(markup);
        let Some((list, kind)) = find_list(&dom.document) else {
            tracing::debug!(key = %block.key, "list sentinels without a list element");
            return None;
        };

        let mut items = Vec::new();
        let mut mark_defs = Vec::new();
        self.collect_items(&list, kind, 1, &mut mark_defs, &mut items);

        let mut blocks: Vec<TextBlock> = items
            .into_iter()
            .map(|item| {
                let mut block = TextBlock::list_item(item.kind, item.level, item.spans);
                block.mark_defs = mark_defs.clone();
                block
            })
            .collect();

        // The first item keeps the pasted block's identity.
        if let Some(first) = blocks.first_mut() {
            if !block.key.is_empty() {
                first.key = block.key.clone();
            }
        }
        Some(blocks)
    }

    fn collect_items(
        &mut self,
        list: &Handle,
        kind: ListKind,
        level: u32,
        mark_defs: &mut Vec<MarkDef>,
        out: &mut Vec<ListItem>,
    ) {
        for child in list.children.borrow().iter() {
            if element_name(child).as_deref() != Some("li") {
                continue;
            }
            let mut collector = RunCollector::default();
            for grandchild in child.children.borrow().iter() {
                self.walk(grandchild, &mut collector, mark_defs);
            }
            out.push(ListItem {
                kind,
                level,
                spans: merge_runs(collector.runs),
            });
            for nested in collector.nested {
                if let Some(nested_kind) = element_name(&nested).as_deref().and_then(list_kind_for) {
                    self.collect_items(&nested, nested_kind, level + 1, mark_defs, out);
                }
            }
        }
    }

    fn walk(&mut self, node: &Handle, collector: &mut RunCollector, mark_defs: &mut Vec<MarkDef>) {
        match &node.data {
            NodeData::Text { contents } => {
                let contents = contents.borrow();
                let text: &str = &contents;
                if !text.is_empty() {
                    collector.runs.push(Run {
                        text: text.to_owned(),
                        marks: collector.active.clone(),
                    });
                }
            }
            NodeData::Element { name, attrs, .. } => {
                let tag: &str = &name.local;
                let mark: Option<SmolStr> = match tag {
                    "b" | "strong" => Some(SmolStr::new_static(decorator::STRONG)),
                    "i" | "em" => Some(SmolStr::new_static(decorator::EM)),
                    "u" => Some(SmolStr::new_static(decorator::UNDERLINE)),
                    "a" => attrs
                        .borrow()
                        .iter()
                        .find(|attr| &*attr.name.local == "href")
                        .map(|attr| self.link_mark(&attr.value, mark_defs)),
                    "br" => {
                        collector.runs.push(Run {
                            text: "\n".to_owned(),
                            marks: collector.active.clone(),
                        });
                        return;
                    }
                    "ul" | "ol" => {
                        collector.nested.push(node.clone());
                        return;
                    }
                    _ => None,
                };

                let pushed = match mark {
                    Some(mark) if !collector.active.contains(&mark) => {
                        collector.active.push(mark);
                        true
                    }
                    _ => false,
                };
                for child in node.children.borrow().iter() {
                    self.walk(child, collector, mark_defs);
                }
                if pushed {
                    collector.active.pop();
                }
            }
            _ => {}
        }
    }

    fn link_mark(&mut self, href: &str, mark_defs: &mut Vec<MarkDef>) -> SmolStr {
        let key = self
            .link_keys
            .entry(href.to_owned())
            .or_insert_with(new_key)
            .clone();
        if !mark_defs.iter().any(|def| def.key == key) {
            mark_defs.push(MarkDef {
                key: key.clone(),
                href: href.to_owned(),
            });
        }
        key
    }
}

/// Normalize a block sequence with a fresh [`ListNormalizer`].
pub fn normalize_blocks(blocks: &[Block]) -> Vec<Block> {
    ListNormalizer::new().normalize_blocks(blocks)
}

#[derive(Debug)]
struct ListItem {
    kind: ListKind,
    level: u32,
    spans: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq)]
struct Run {
    text: String,
    marks: Vec<SmolStr>,
}

#[derive(Default)]
struct RunCollector {
    runs: Vec<Run>,
    active: Vec<SmolStr>,
    nested: Vec<Handle>,
}

/// The markup between the first and last occurrence of whichever sentinel
/// appears first, if it appears at least twice.
fn sentinel_contents(text: &str) -> Option<&str> {
    let sentinel = [BULLET_SENTINEL, NUMBER_SENTINEL]
        .into_iter()
        .filter_map(|s| text.find(s).map(|pos| (pos, s)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, s)| s)?;

    let start = text.find(sentinel)? + sentinel.len();
    let end = text.rfind(sentinel)?;
    (end >= start).then(|| &text[start..end])
}

fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn list_kind_for(tag: &str) -> Option<ListKind> {
    match tag {
        "ul" => Some(ListKind::Bullet),
        "ol" => Some(ListKind::Number),
        _ => None,
    }
}

/// First `ul`/`ol` element in document order.
fn find_list(node: &Handle) -> Option<(Handle, ListKind)> {
    if let Some(kind) = element_name(node).as_deref().and_then(list_kind_for) {
        return Some((node.clone(), kind));
    }
    node.children.borrow().iter().find_map(find_list)
}

fn same_marks(a: &[SmolStr], b: &[SmolStr]) -> bool {
    a.len() == b.len() && a.iter().all(|mark| b.contains(mark))
}

/// Merge adjacent runs with set-equal marks into spans.
fn merge_runs(runs: Vec<Run>) -> Vec<Span> {
    let mut merged: Vec<Run> = Vec::new();
    for run in runs {
        match merged.last_mut() {
            Some(last) if same_marks(&last.marks, &run.marks) => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }
    merged
        .into_iter()
        .map(|run| Span::with_marks(run.text, run.marks))
        .collect()
}
