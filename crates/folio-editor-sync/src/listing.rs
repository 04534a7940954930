//! Listing documents with their draft/published status.

use std::collections::BTreeMap;

use folio_common::DocumentStore;
use folio_common::store::ids::{is_draft, published_id};
use folio_common::store::{DocumentQuery, Object};
use serde::Serialize;
use serde_json::Value;

use crate::document::DocumentKind;
use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentStatus {
    /// Never published.
    Draft,
    Published,
    /// Published, with unpublished edits in a draft.
    PublishedWithChanges,
}

/// One row of a document listing. Title and slug come from the draft when
/// one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Default)]
struct Pair {
    draft: Option<Object>,
    published: Option<Object>,
}

fn text(document: &Object, field: &str) -> Option<String> {
    document.get(field).and_then(Value::as_str).map(str::to_owned)
}

fn slug(document: &Object) -> String {
    document
        .get("slug")
        .and_then(|slug| slug.get("current"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

/// Every document of `kind`, one row per identity, ordered by id.
pub async fn list_documents<S: DocumentStore>(
    store: &S,
    kind: DocumentKind,
) -> Result<Vec<DocumentSummary>, SyncError> {
    let documents = store.query(&DocumentQuery::of_type(kind.as_str())).await?;

    let mut pairs: BTreeMap<String, Pair> = BTreeMap::new();
    for document in documents {
        let Some(id) = text(&document, "_id") else {
            continue;
        };
        let pair = pairs.entry(published_id(&id)).or_default();
        if is_draft(&id) {
            pair.draft = Some(document);
        } else {
            pair.published = Some(document);
        }
    }

    let summaries = pairs
        .into_iter()
        .filter_map(|(id, pair)| {
            let (status, current) = match (&pair.draft, &pair.published) {
                (Some(draft), None) => (DocumentStatus::Draft, draft),
                (None, Some(published)) => (DocumentStatus::Published, published),
                (Some(draft), Some(_)) => (DocumentStatus::PublishedWithChanges, draft),
                (None, None) => return None,
            };
            Some(DocumentSummary {
                title: text(current, "title").unwrap_or_default(),
                slug: slug(current),
                status,
                published_at: pair
                    .published
                    .as_ref()
                    .and_then(|published| text(published, "publishedAt")),
                updated_at: text(current, "_updatedAt"),
                id,
            })
        })
        .collect();
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_common::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_status_per_identity() {
        let store = MemoryStore::new();
        for doc in [
            json!({ "_id": "drafts.a", "_type": "post", "title": "Only draft" }),
            json!({ "_id": "b", "_type": "post", "title": "Live", "publishedAt": "2024-05-01T00:00:00Z" }),
            json!({ "_id": "c", "_type": "post", "title": "Old" }),
            json!({ "_id": "drafts.c", "_type": "post", "title": "New", "slug": { "current": "new" } }),
            json!({ "_id": "d", "_type": "page", "title": "About" }),
        ] {
            store.create(object(doc)).await.unwrap();
        }

        let posts = list_documents(&store, DocumentKind::Post).await.unwrap();
        let rows: Vec<(&str, &str, DocumentStatus)> = posts
            .iter()
            .map(|s| (s.id.as_str(), s.title.as_str(), s.status))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("a", "Only draft", DocumentStatus::Draft),
                ("b", "Live", DocumentStatus::Published),
                ("c", "New", DocumentStatus::PublishedWithChanges),
            ]
        );
        assert_eq!(posts[1].published_at.as_deref(), Some("2024-05-01T00:00:00Z"));
        assert_eq!(posts[2].slug, "new");
        assert!(posts[0].updated_at.is_some());

        let pages = list_documents(&store, DocumentKind::Page).await.unwrap();
        assert_eq!(pages.len(), 1);
    }
}
