//! The document aggregate and its stored JSON form.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use folio_common::blake3;
use folio_common::store::ids::{draft_id, published_id};
use folio_common::store::{Object, Transaction};
use folio_common::StoreError;
use folio_editor_core::{Block, ImageValue, prepare_body};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::error::{SyncError, ValidationError};

/// What a document is published as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Post,
    Page,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Post => "post",
            DocumentKind::Page => "page",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(DocumentKind::Post),
            "page" => Ok(DocumentKind::Page),
            other => Err(format!("unknown document kind `{other}` (expected post or page)")),
        }
    }
}

/// Who may read a published document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Members,
    Paid,
}

/// Keyed reference to another document, such as an author or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type", rename = "reference")]
pub struct Reference {
    #[serde(rename = "_key", default)]
    pub key: SmolStr,
    #[serde(rename = "_ref")]
    pub id: String,
}

impl Reference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            key: folio_editor_core::new_key(),
            id: id.into(),
        }
    }
}

mod slug_field {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    fn slug_type() -> String {
        "slug".to_owned()
    }

    #[derive(Serialize, Deserialize)]
    struct SlugValue {
        #[serde(rename = "_type", default = "slug_type")]
        kind: String,
        #[serde(default)]
        current: String,
    }

    pub fn serialize<S: Serializer>(slug: &str, serializer: S) -> Result<S::Ok, S::Error> {
        SlugValue {
            kind: slug_type(),
            current: slug.to_owned(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(SlugValue::deserialize(deserializer)?.current)
    }
}

/// A post or page as edited and stored.
///
/// `id` is the id this copy lives under: edited documents carry the draft id,
/// the published copy shares the identity without the `drafts.` prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub kind: DocumentKind,
    #[serde(default)]
    pub title: String,
    #[serde(default, with = "slug_field")]
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    /// Written as `null` when absent so a patch clears the stored value.
    #[serde(default)]
    pub featured_image: Option<ImageValue>,
    #[serde(default)]
    pub body: Vec<Block>,
    #[serde(default)]
    pub authors: Vec<Reference>,
    #[serde(default)]
    pub tags: Vec<Reference>,
    #[serde(default)]
    pub access: Access,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// The fields whose change triggers an auto-save.
#[derive(Serialize)]
struct Tracked<'a> {
    title: &'a str,
    slug: &'a str,
    excerpt: &'a str,
    featured_image: &'a Option<ImageValue>,
    body: &'a [Block],
    authors: &'a [Reference],
    tags: &'a [Reference],
    access: Access,
}

impl Document {
    /// A fresh draft with a new identity and one empty paragraph.
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            id: draft_id(&uuid::Uuid::new_v4().to_string()),
            kind,
            title: String::new(),
            slug: String::new(),
            excerpt: String::new(),
            featured_image: None,
            body: vec![Block::paragraph()],
            authors: Vec::new(),
            tags: Vec::new(),
            access: Access::default(),
            created_at: Utc::now(),
            published_at: None,
        }
    }

    /// Read a stored document, dropping body blocks that cannot be
    /// understood instead of failing the whole load.
    pub fn from_value(value: Value) -> Result<Self, SyncError> {
        let id = value
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let mut object = match value {
            Value::Object(object) => object,
            _ => return Err(StoreError::NotAnObject { id }.into()),
        };
        let body = object.remove("body");

        let mut document: Document = serde_json::from_value(Value::Object(object))
            .map_err(|source| SyncError::InvalidDocument {
                id: id.clone(),
                source,
            })?;
        document.body = read_body(&id, body);
        Ok(document)
    }

    pub fn from_object(object: Object) -> Result<Self, SyncError> {
        Self::from_value(Value::Object(object))
    }

    pub fn draft_id(&self) -> String {
        draft_id(&self.id)
    }

    pub fn published_id(&self) -> String {
        published_id(&self.id)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.kind == DocumentKind::Post && self.authors.is_empty() {
            return Err(ValidationError::MissingAuthor);
        }
        Ok(())
    }

    /// Hash of the tracked fields, as edited (before save-time normalization).
    pub fn content_hash(&self) -> blake3::Hash {
        let tracked = Tracked {
            title: &self.title,
            slug: &self.slug,
            excerpt: &self.excerpt,
            featured_image: &self.featured_image,
            body: &self.body,
            authors: &self.authors,
            tags: &self.tags,
            access: self.access,
        };
        match serde_json::to_vec(&tracked) {
            Ok(bytes) => blake3::hash(&bytes),
            Err(error) => {
                tracing::error!(%error, id = %self.id, "failed to serialize tracked fields");
                blake3::hash(&[])
            }
        }
    }

    /// The stored form under `id`: normalized body, image assets as
    /// references.
    pub fn to_payload(&self, id: &str) -> Result<Object, SyncError> {
        let mut prepared = self.clone();
        prepared.id = id.to_owned();
        prepared.body = prepare_body(&self.body);
        prepared.featured_image = self.featured_image.as_ref().map(ImageValue::to_reference);

        match serde_json::to_value(&prepared).map_err(StoreError::from)? {
            Value::Object(object) => Ok(object),
            _ => Err(StoreError::NotAnObject { id: id.to_owned() }.into()),
        }
    }

    /// Write the draft: create it if needed, then set every field.
    pub fn draft_transaction(&self) -> Result<Transaction, SyncError> {
        let id = self.draft_id();
        let payload = self.to_payload(&id)?;
        Ok(Transaction::new()
            .create_if_not_exists(payload.clone())
            .patch(id, payload))
    }
}

/// Parse a stored body, dropping blocks whose type is unknown or whose
/// fields are malformed. Text blocks without spans get an empty one. `id`
/// only labels the warnings.
pub fn read_body(id: &str, body: Option<Value>) -> Vec<Block> {
    let Some(Value::Array(items)) = body else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Block>(item) {
            Ok(mut block) => {
                if let Block::Text(text) = &mut block {
                    text.ensure_span();
                }
                Some(block)
            }
            Err(error) => {
                tracing::warn!(%id, %error, "dropping unreadable block");
                None
            }
        })
        .collect()
}
