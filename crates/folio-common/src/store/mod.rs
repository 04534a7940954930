//! The remote document store contract.
//!
//! Folio never talks to a wire protocol directly: everything it persists goes
//! through [`DocumentStore`]. Documents are JSON objects with an `_id` and a
//! `_type`; writes are expressed as [`Mutation`]s, optionally grouped into an
//! atomic [`Transaction`].

mod dir;
pub mod ids;
mod memory;

use std::collections::BTreeMap;
use std::future::Future;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

pub use dir::DirStore;
pub use memory::MemoryStore;

/// A stored document: a JSON object carrying at least `_id` and `_type`.
pub type Object = Map<String, Value>;

/// A single write against the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    /// Create a document; fails if the id is taken.
    Create { document: Object },
    /// Create a document unless the id is taken, in which case nothing happens.
    CreateIfNotExists { document: Object },
    /// Set top-level fields on an existing document.
    Patch { id: String, set: Object },
    /// Delete a document. Deleting an absent id is not an error.
    Delete { id: String },
}

/// An ordered list of mutations applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub mutations: Vec<Mutation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, document: Object) -> Self {
        self.mutations.push(Mutation::Create { document });
        self
    }

    pub fn create_if_not_exists(mut self, document: Object) -> Self {
        self.mutations.push(Mutation::CreateIfNotExists { document });
        self
    }

    pub fn patch(mut self, id: impl Into<String>, set: Object) -> Self {
        self.mutations.push(Mutation::Patch {
            id: id.into(),
            set,
        });
        self
    }

    pub fn delete(mut self, id: impl Into<String>) -> Self {
        self.mutations.push(Mutation::Delete { id: id.into() });
        self
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Filter for [`DocumentStore::query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    /// Only documents whose `_type` equals this.
    pub doc_type: Option<String>,
}

impl DocumentQuery {
    pub fn of_type(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: Some(doc_type.into()),
        }
    }

    pub fn matches(&self, document: &Object) -> bool {
        match &self.doc_type {
            Some(doc_type) => {
                document.get("_type").and_then(Value::as_str) == Some(doc_type.as_str())
            }
            None => true,
        }
    }
}

/// A binary asset accepted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    /// Asset document id, referenced from image fields.
    pub id: String,
    /// Public URL of the asset.
    pub url: String,
    pub mime_type: String,
    pub size: u64,
}

/// The remote document store.
///
/// Required methods are the primitive reads, transactional commit and asset
/// upload. Single-document writes are provided on top of [`commit`](Self::commit).
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id.
    fn get(&self, id: &str) -> impl Future<Output = Result<Option<Object>, StoreError>> + Send;

    /// Fetch every document matching `query`, ordered by id.
    fn query(
        &self,
        query: &DocumentQuery,
    ) -> impl Future<Output = Result<Vec<Object>, StoreError>> + Send;

    /// Apply all mutations of `transaction` atomically.
    fn commit(&self, transaction: Transaction)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Upload a binary asset.
    fn upload_asset(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> impl Future<Output = Result<UploadedAsset, StoreError>> + Send;

    fn create(&self, document: Object) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.commit(Transaction::new().create(document))
    }

    fn create_if_not_exists(
        &self,
        document: Object,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.commit(Transaction::new().create_if_not_exists(document))
    }

    fn patch(&self, id: &str, set: Object) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.commit(Transaction::new().patch(id, set))
    }

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.commit(Transaction::new().delete(id))
    }
}

/// Read the `_id` of a document.
pub fn document_id(document: &Object) -> Result<&str, StoreError> {
    document
        .get("_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(StoreError::MissingId)
}

/// Apply `mutations` in order to `documents`.
///
/// On error `documents` may be partially modified; callers apply to a scratch
/// copy and swap it in only on success.
pub(crate) fn apply_mutations(
    documents: &mut BTreeMap<String, Object>,
    mutations: Vec<Mutation>,
) -> Result<(), StoreError> {
    let now = Value::String(Utc::now().to_rfc3339());
    for mutation in mutations {
        match mutation {
            Mutation::Create { mut document } => {
                let id = document_id(&document)?.to_owned();
                if documents.contains_key(&id) {
                    return Err(StoreError::AlreadyExists { id });
                }
                document.insert("_updatedAt".into(), now.clone());
                documents.insert(id, document);
            }
            Mutation::CreateIfNotExists { mut document } => {
                let id = document_id(&document)?.to_owned();
                if !documents.contains_key(&id) {
                    document.insert("_updatedAt".into(), now.clone());
                    documents.insert(id, document);
                }
            }
            Mutation::Patch { id, set } => {
                let Some(existing) = documents.get_mut(&id) else {
                    return Err(StoreError::NotFound { id });
                };
                for (field, value) in set {
                    if field == "_id" {
                        continue;
                    }
                    existing.insert(field, value);
                }
                existing.insert("_updatedAt".into(), now.clone());
            }
            Mutation::Delete { id } => {
                documents.remove(&id);
            }
        }
    }
    Ok(())
}

/// Ids touched by a list of mutations, in first-seen order.
pub(crate) fn touched_ids(mutations: &[Mutation]) -> Result<Vec<String>, StoreError> {
    let mut ids: Vec<String> = Vec::new();
    for mutation in mutations {
        let id = match mutation {
            Mutation::Create { document }
            | Mutation::CreateIfNotExists { document } => document_id(document)?.to_owned(),
            Mutation::Patch { id, .. } | Mutation::Delete { id } => id.clone(),
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Content-addressed asset id for uploaded bytes.
pub(crate) fn asset_id(bytes: &[u8], mime_type: &str) -> String {
    let hash = blake3::hash(bytes).to_hex();
    let kind = if mime_type.starts_with("image/") {
        "image"
    } else {
        "file"
    };
    format!("{kind}-{}", &hash.as_str()[..24])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Object {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_create_twice_conflicts() {
        let mut docs = BTreeMap::new();
        let doc = object(json!({ "_id": "a", "_type": "post" }));
        apply_mutations(&mut docs, vec![Mutation::Create { document: doc.clone() }]).unwrap();
        let err = apply_mutations(&mut docs, vec![Mutation::Create { document: doc }]).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[test]
    fn test_create_if_not_exists_keeps_existing() {
        let mut docs = BTreeMap::new();
        let first = object(json!({ "_id": "a", "title": "first" }));
        let second = object(json!({ "_id": "a", "title": "second" }));
        apply_mutations(
            &mut docs,
            vec![
                Mutation::CreateIfNotExists { document: first },
                Mutation::CreateIfNotExists { document: second },
            ],
        )
        .unwrap();
        assert_eq!(docs["a"]["title"], "first");
    }

    #[test]
    fn test_patch_missing_document() {
        let mut docs = BTreeMap::new();
        let err = apply_mutations(
            &mut docs,
            vec![Mutation::Patch {
                id: "nope".into(),
                set: Object::new(),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_patch_never_rewrites_id() {
        let mut docs = BTreeMap::new();
        docs.insert("a".to_owned(), object(json!({ "_id": "a" })));
        apply_mutations(
            &mut docs,
            vec![Mutation::Patch {
                id: "a".into(),
                set: object(json!({ "_id": "b", "title": "t" })),
            }],
        )
        .unwrap();
        assert_eq!(docs["a"]["_id"], "a");
        assert_eq!(docs["a"]["title"], "t");
    }

    #[test]
    fn test_query_matching() {
        let doc = object(json!({ "_id": "drafts.a", "_type": "post" }));
        assert!(DocumentQuery::of_type("post").matches(&doc));
        assert!(!DocumentQuery::of_type("page").matches(&doc));
        assert!(DocumentQuery::default().matches(&doc));
    }

    #[test]
    fn test_transaction_builder_order() {
        let tx = Transaction::new()
            .create_if_not_exists(object(json!({ "_id": "a" })))
            .delete("drafts.a");
        assert_eq!(tx.len(), 2);
        assert_eq!(touched_ids(&tx.mutations).unwrap(), vec!["a", "drafts.a"]);
    }
}
