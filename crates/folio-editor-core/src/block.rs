//! Block model: the ordered content units of a document body.
//!
//! The JSON shape follows the store's portable rich-text convention: every
//! block carries `_type` and `_key`, text blocks hold `children` spans plus
//! out-of-line `markDefs`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::UnknownComponentKind;
use crate::keys::new_key;

/// Paragraph style used for body text and for every list item.
pub const DEFAULT_STYLE: &str = "normal";

/// Decorator marks understood by the editor.
pub mod decorator {
    pub const STRONG: &str = "strong";
    pub const EM: &str = "em";
    pub const UNDERLINE: &str = "underline";
}

fn default_style() -> SmolStr {
    SmolStr::new_static(DEFAULT_STYLE)
}

/// Kind of list a list-item block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Number,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Bullet => "bullet",
            ListKind::Number => "number",
        }
    }

    /// Older documents encoded list items in `style` instead of `listItem`.
    pub fn from_legacy_style(style: &str) -> Option<Self> {
        match style {
            "bullet" => Some(ListKind::Bullet),
            "number" => Some(ListKind::Number),
            _ => None,
        }
    }
}

/// Inline text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "span")]
pub struct Span {
    #[serde(rename = "_key", default)]
    pub key: SmolStr,
    #[serde(default)]
    pub text: String,
    /// Decorators and mark-definition keys, in application order.
    #[serde(default)]
    pub marks: Vec<SmolStr>,
}

impl Span {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            key: new_key(),
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new("")
    }

    pub fn with_marks(text: impl Into<String>, marks: Vec<SmolStr>) -> Self {
        Self {
            key: new_key(),
            text: text.into(),
            marks,
        }
    }

    pub fn has_mark(&self, mark: &str) -> bool {
        self.marks.iter().any(|m| m == mark)
    }
}

/// Out-of-line annotation referenced from [`Span::marks`]. Only links exist today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "link")]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: SmolStr,
    pub href: String,
}

/// A paragraph, heading or list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(rename = "_key", default)]
    pub key: SmolStr,
    #[serde(default = "default_style")]
    pub style: SmolStr,
    #[serde(default)]
    pub children: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<ListKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default)]
    pub mark_defs: Vec<MarkDef>,
}

impl TextBlock {
    /// An empty paragraph with a single empty span.
    pub fn paragraph() -> Self {
        Self::with_spans(DEFAULT_STYLE, vec![Span::empty()])
    }

    pub fn with_text(style: &str, text: impl Into<String>) -> Self {
        Self::with_spans(style, vec![Span::new(text)])
    }

    /// A block with the given spans. An empty span list gets one empty span.
    pub fn with_spans(style: &str, mut children: Vec<Span>) -> Self {
        if children.is_empty() {
            children.push(Span::empty());
        }
        Self {
            key: new_key(),
            style: SmolStr::new(style),
            children,
            list_item: None,
            level: None,
            mark_defs: Vec::new(),
        }
    }

    pub fn list_item(kind: ListKind, level: u32, children: Vec<Span>) -> Self {
        let mut block = Self::with_spans(DEFAULT_STYLE, children);
        block.list_item = Some(kind);
        block.level = Some(level.max(1));
        block
    }

    /// True when there are no spans or every span is whitespace.
    pub fn is_empty(&self) -> bool {
        self.children.iter().all(|span| span.text.trim().is_empty())
    }

    pub fn is_list_item(&self) -> bool {
        self.list_item.is_some()
    }

    /// Concatenated text of every span.
    pub fn plain_text(&self) -> String {
        self.children.iter().map(|span| span.text.as_str()).collect()
    }

    /// Restore the at-least-one-span invariant.
    pub fn ensure_span(&mut self) {
        if self.children.is_empty() {
            self.children.push(Span::empty());
        }
    }
}

/// Fully resolved asset, as returned by an upload or an expanded query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(rename = "_id")]
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Lightweight pointer to an asset document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "reference")]
pub struct AssetReference {
    #[serde(rename = "_ref")]
    pub id: String,
}

/// The asset of an image, either as stored (reference) or as edited (expanded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetSlot {
    Reference(AssetReference),
    Expanded(Asset),
}

impl AssetSlot {
    pub fn id(&self) -> &str {
        match self {
            AssetSlot::Reference(r) => &r.id,
            AssetSlot::Expanded(a) => &a.id,
        }
    }

    /// Collapse to a reference-by-id.
    pub fn to_reference(&self) -> AssetSlot {
        AssetSlot::Reference(AssetReference {
            id: self.id().to_owned(),
        })
    }
}

/// Image field value, shared by image blocks and featured images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl ImageValue {
    pub fn from_asset(asset: Asset) -> Self {
        Self {
            asset: Some(AssetSlot::Expanded(asset)),
            alt: None,
            caption: None,
        }
    }

    /// Copy with the asset rewritten to a reference.
    pub fn to_reference(&self) -> Self {
        Self {
            asset: self.asset.as_ref().map(AssetSlot::to_reference),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlock {
    #[serde(rename = "_key", default)]
    pub key: SmolStr,
    #[serde(flatten)]
    pub image: ImageValue,
}

impl ImageBlock {
    pub fn new(image: ImageValue) -> Self {
        Self {
            key: new_key(),
            image,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DividerStyle {
    #[default]
    Plain,
    Dotted,
    Ornament,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DividerFields {
    pub style: DividerStyle,
}

/// A list of recent posts rendered inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostListingFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub count: u32,
    pub show_date: bool,
    pub show_read_time: bool,
    pub show_excerpt: bool,
    /// Restrict to posts carrying this tag id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Default for PostListingFields {
    fn default() -> Self {
        Self {
            heading: None,
            count: 5,
            show_date: true,
            show_read_time: true,
            show_excerpt: false,
            tag: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    #[default]
    Primary,
    Secondary,
    Outline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonFields {
    pub label: String,
    pub url: String,
    pub style: ButtonStyle,
}

impl Default for ButtonFields {
    fn default() -> Self {
        Self {
            label: "Learn more".to_owned(),
            url: String::new(),
            style: ButtonStyle::Primary,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutTone {
    #[default]
    Info,
    Tip,
    Warning,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalloutFields {
    pub tone: CalloutTone,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedFields {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubscribeFields {
    pub heading: String,
    pub button_label: String,
}

impl Default for SubscribeFields {
    fn default() -> Self {
        Self {
            heading: "Subscribe to the newsletter".to_owned(),
            button_label: "Subscribe".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpacerSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacerFields {
    pub size: SpacerSize,
}

/// Embeddable component payloads, one concrete type per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Component {
    #[serde(rename = "dividerBlock")]
    Divider(DividerFields),
    #[serde(rename = "postListingBlock")]
    PostListing(PostListingFields),
    #[serde(rename = "buttonBlock")]
    Button(ButtonFields),
    #[serde(rename = "calloutBlock")]
    Callout(CalloutFields),
    #[serde(rename = "embedBlock")]
    Embed(EmbedFields),
    #[serde(rename = "subscribeBlock")]
    Subscribe(SubscribeFields),
    #[serde(rename = "spacerBlock")]
    Spacer(SpacerFields),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Divider(_) => ComponentKind::Divider,
            Component::PostListing(_) => ComponentKind::PostListing,
            Component::Button(_) => ComponentKind::Button,
            Component::Callout(_) => ComponentKind::Callout,
            Component::Embed(_) => ComponentKind::Embed,
            Component::Subscribe(_) => ComponentKind::Subscribe,
            Component::Spacer(_) => ComponentKind::Spacer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentBlock {
    #[serde(rename = "_key", default)]
    pub key: SmolStr,
    #[serde(flatten)]
    pub component: Component,
}

impl ComponentBlock {
    pub fn new(component: Component) -> Self {
        Self {
            key: new_key(),
            component,
        }
    }
}

/// One unit of a document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Block {
    #[serde(rename = "block")]
    Text(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(untagged)]
    Component(ComponentBlock),
}

impl Block {
    pub fn paragraph() -> Self {
        Block::Text(TextBlock::paragraph())
    }

    /// A new block of `kind` carrying that kind's default payload.
    pub fn for_kind(kind: ComponentKind) -> Self {
        let component = match kind {
            ComponentKind::Paragraph => return Block::paragraph(),
            ComponentKind::Image => return Block::Image(ImageBlock::new(ImageValue::default())),
            ComponentKind::Divider => Component::Divider(DividerFields::default()),
            ComponentKind::PostListing => Component::PostListing(PostListingFields::default()),
            ComponentKind::Button => Component::Button(ButtonFields::default()),
            ComponentKind::Callout => Component::Callout(CalloutFields::default()),
            ComponentKind::Embed => Component::Embed(EmbedFields::default()),
            ComponentKind::Subscribe => Component::Subscribe(SubscribeFields::default()),
            ComponentKind::Spacer => Component::Spacer(SpacerFields::default()),
        };
        Block::Component(ComponentBlock::new(component))
    }

    pub fn key(&self) -> &str {
        match self {
            Block::Text(b) => &b.key,
            Block::Image(b) => &b.key,
            Block::Component(b) => &b.key,
        }
    }

    pub fn set_key(&mut self, key: SmolStr) {
        match self {
            Block::Text(b) => b.key = key,
            Block::Image(b) => b.key = key,
            Block::Component(b) => b.key = key,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Block::Text(_) => ComponentKind::Paragraph,
            Block::Image(_) => ComponentKind::Image,
            Block::Component(b) => b.component.kind(),
        }
    }

    /// The `_type` tag this block persists with.
    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }

    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            Block::Text(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextBlock> {
        match self {
            Block::Text(b) => Some(b),
            _ => None,
        }
    }

    pub fn list_kind(&self) -> Option<ListKind> {
        self.as_text().and_then(|b| b.list_item)
    }
}

impl From<TextBlock> for Block {
    fn from(block: TextBlock) -> Self {
        Block::Text(block)
    }
}

/// Every block type the editor can insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Paragraph,
    Image,
    Divider,
    PostListing,
    Button,
    Callout,
    Embed,
    Subscribe,
    Spacer,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 9] = [
        ComponentKind::Paragraph,
        ComponentKind::Image,
        ComponentKind::Divider,
        ComponentKind::PostListing,
        ComponentKind::Button,
        ComponentKind::Callout,
        ComponentKind::Embed,
        ComponentKind::Subscribe,
        ComponentKind::Spacer,
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            ComponentKind::Paragraph => "block",
            ComponentKind::Image => "image",
            ComponentKind::Divider => "dividerBlock",
            ComponentKind::PostListing => "postListingBlock",
            ComponentKind::Button => "buttonBlock",
            ComponentKind::Callout => "calloutBlock",
            ComponentKind::Embed => "embedBlock",
            ComponentKind::Subscribe => "subscribeBlock",
            ComponentKind::Spacer => "spacerBlock",
        }
    }

    /// Whether blocks of this kind hold editable text.
    pub fn is_text(&self) -> bool {
        matches!(self, ComponentKind::Paragraph)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ComponentKind {
    type Err = UnknownComponentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::ALL
            .into_iter()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| UnknownComponentKind(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_paragraph_has_one_empty_span() {
        let block = TextBlock::paragraph();
        assert_eq!(block.children.len(), 1);
        assert!(block.is_empty());
        assert!(!block.key.is_empty());
    }

    #[test]
    fn test_is_empty_ignores_whitespace() {
        let mut block = TextBlock::with_spans(DEFAULT_STYLE, vec![Span::new("  "), Span::new("\n")]);
        assert!(block.is_empty());
        block.children.clear();
        assert!(block.is_empty());
        block.children.push(Span::new(" x "));
        assert!(!block.is_empty());
    }

    #[test]
    fn test_text_block_json_shape() {
        let block = Block::Text(TextBlock {
            key: "k1".into(),
            style: "normal".into(),
            children: vec![Span {
                key: "s1".into(),
                text: "Hi".into(),
                marks: vec!["strong".into()],
            }],
            list_item: Some(ListKind::Bullet),
            level: Some(1),
            mark_defs: vec![],
        });
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value,
            json!({
                "_type": "block",
                "_key": "k1",
                "style": "normal",
                "children": [{ "_type": "span", "_key": "s1", "text": "Hi", "marks": ["strong"] }],
                "listItem": "bullet",
                "level": 1,
                "markDefs": []
            })
        );
        let back: Block = serde_json::from_value(value).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_component_json_shape() {
        let block = Block::Component(ComponentBlock {
            key: "c1".into(),
            component: Component::PostListing(PostListingFields::default()),
        });
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["_type"], "postListingBlock");
        assert_eq!(value["_key"], "c1");
        assert_eq!(value["count"], 5);
        assert_eq!(value["showDate"], true);
        assert_eq!(value["showReadTime"], true);

        let back: Block = serde_json::from_value(value).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_component_missing_fields_take_defaults() {
        let block: Block =
            serde_json::from_value(json!({ "_type": "dividerBlock", "_key": "d" })).unwrap();
        assert_eq!(block.kind(), ComponentKind::Divider);
        match block {
            Block::Component(ComponentBlock {
                component: Component::Divider(fields),
                ..
            }) => assert_eq!(fields.style, DividerStyle::Plain),
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[test]
    fn test_image_asset_forms() {
        let expanded: Block = serde_json::from_value(json!({
            "_type": "image",
            "_key": "i",
            "asset": { "_id": "image-1", "url": "https://cdn/x.png" }
        }))
        .unwrap();
        let Block::Image(image) = expanded else {
            panic!("expected image");
        };
        assert!(matches!(image.image.asset, Some(AssetSlot::Expanded(_))));

        let reference = image.image.to_reference();
        assert_eq!(
            serde_json::to_value(&reference).unwrap(),
            json!({ "asset": { "_type": "reference", "_ref": "image-1" } })
        );
    }

    #[test]
    fn test_unknown_type_fails_to_parse() {
        let result: Result<Block, _> =
            serde_json::from_value(json!({ "_type": "mysteryBlock", "_key": "m" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_component_kind_from_str() {
        assert_eq!("dividerBlock".parse(), Ok(ComponentKind::Divider));
        assert_eq!("block".parse(), Ok(ComponentKind::Paragraph));
        assert!("nope".parse::<ComponentKind>().is_err());
        for kind in ComponentKind::ALL {
            assert_eq!(Block::for_kind(kind).kind(), kind);
        }
    }
}
