//! Promoting a draft to the published copy.

use chrono::{DateTime, Utc};
use folio_common::DocumentStore;
use folio_common::store::Transaction;

use crate::document::Document;
use crate::error::SyncError;

/// The atomic publish write: ensure the published copy exists, overwrite its
/// content and publish time, and delete the draft.
pub fn publish_transaction(
    document: &Document,
    published_at: DateTime<Utc>,
) -> Result<Transaction, SyncError> {
    let published_id = document.published_id();
    let mut published = document.clone();
    published.published_at = Some(published_at);
    let payload = published.to_payload(&published_id)?;

    Ok(Transaction::new()
        .create_if_not_exists(payload.clone())
        .patch(published_id, payload)
        .delete(document.draft_id()))
}

/// Validate and publish `document`. A document that was published before
/// keeps its original publish time.
pub async fn publish_document<S: DocumentStore>(
    store: &S,
    document: &Document,
) -> Result<DateTime<Utc>, SyncError> {
    document.validate()?;
    let published_at = document.published_at.unwrap_or_else(Utc::now);
    store
        .commit(publish_transaction(document, published_at)?)
        .await?;
    tracing::info!(id = %document.published_id(), %published_at, "published document");
    Ok(published_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentKind, Reference};
    use crate::error::ValidationError;
    use folio_common::store::MemoryStore;
    use serde_json::json;

    fn ready_post() -> Document {
        let mut doc = Document::new(DocumentKind::Post);
        doc.id = "drafts.p1".into();
        doc.title = "Launch".into();
        doc.authors.push(Reference::new("author-1"));
        doc
    }

    #[test]
    fn test_transaction_shape() {
        let tx = publish_transaction(&ready_post(), Utc::now()).unwrap();
        let value = serde_json::to_value(&tx).unwrap();
        let ops: Vec<&str> = value["mutations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["op"].as_str().unwrap())
            .collect();
        assert_eq!(ops, ["createIfNotExists", "patch", "delete"]);
        assert_eq!(value["mutations"][1]["id"], "p1");
        assert!(value["mutations"][1]["set"]["publishedAt"].is_string());
        assert_eq!(value["mutations"][2], json!({ "op": "delete", "id": "drafts.p1" }));
    }

    #[tokio::test]
    async fn test_publish_promotes_and_deletes_draft() {
        let store = MemoryStore::new();
        let doc = ready_post();
        store.commit(doc.draft_transaction().unwrap()).await.unwrap();

        publish_document(&store, &doc).await.unwrap();

        let docs = store.documents();
        assert!(!docs.contains_key("drafts.p1"));
        assert_eq!(docs["p1"]["title"], "Launch");
        assert!(docs["p1"]["publishedAt"].is_string());
    }

    #[tokio::test]
    async fn test_republish_keeps_publish_time() {
        let store = MemoryStore::new();
        let mut doc = ready_post();
        let first = publish_document(&store, &doc).await.unwrap();
        doc.published_at = Some(first);
        doc.title = "Launch, updated".into();

        let second = publish_document(&store, &doc).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.documents()["p1"]["title"], "Launch, updated");
    }

    #[tokio::test]
    async fn test_invalid_document_is_not_written() {
        let store = MemoryStore::new();
        let mut doc = ready_post();
        doc.authors.clear();

        let err = publish_document(&store, &doc).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Validation(ValidationError::MissingAuthor)
        ));
        assert_eq!(store.commit_count(), 0);
    }
}
