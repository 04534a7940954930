use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::StoreError;

use super::{
    DocumentQuery, DocumentStore, Object, Transaction, UploadedAsset, apply_mutations, asset_id,
    touched_ids,
};

/// A [`DocumentStore`] keeping one pretty-printed JSON file per document id.
///
/// Layout:
/// - `<root>/<id>.json` for documents (draft ids keep their `drafts.` prefix)
/// - `<root>/assets/<asset-id>-<filename>` for uploads
///
/// Commits are serialized by an internal lock. Every mutation is validated
/// against the current files, and every new file is staged next to its target,
/// before anything visible changes.
pub struct DirStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

/// Reject names that would resolve outside the store root.
fn checked_name(name: &str) -> Result<&str, StoreError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(StoreError::InvalidName {
            name: name.to_owned(),
        });
    }
    Ok(name)
}

impl DirStore {
    /// Create a new [`DirStore`] rooted at `root`. The directory is created on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(format!("{}.json", checked_name(id)?)))
    }

    fn staging_path(&self, id: &str) -> PathBuf {
        self.root.join(format!(".{id}.json.tmp"))
    }

    async fn read_document(&self, id: &str) -> Result<Option<Object>, StoreError> {
        let path = self.document_path(id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let value: serde_json::Value = serde_json::from_str(&contents)?;
                match value {
                    serde_json::Value::Object(map) => Ok(Some(map)),
                    _ => Err(StoreError::NotAnObject { id: id.to_owned() }),
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    async fn ensure_dir(&self, dir: &Path) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })
    }

    /// Write `document` to its staging file.
    async fn stage(&self, id: &str, document: &Object) -> Result<PathBuf, StoreError> {
        let staging = self.staging_path(id);
        let contents = serde_json::to_string_pretty(document)?;
        if let Err(source) = tokio::fs::write(&staging, contents).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(StoreError::Io {
                path: staging,
                source,
            });
        }
        Ok(staging)
    }
}

impl DocumentStore for DirStore {
    async fn get(&self, id: &str) -> Result<Option<Object>, StoreError> {
        self.read_document(id).await
    }

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Object>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut found = BTreeMap::new();
        loop {
            let entry = entries.next_entry().await.map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })?;
            let Some(entry) = entry else { break };
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if checked_name(id).is_err() {
                tracing::debug!(path = %path.display(), "skipping file with unusable name");
                continue;
            }
            if let Some(document) = self.read_document(id).await? {
                if query.matches(&document) {
                    found.insert(id.to_owned(), document);
                }
            }
        }
        Ok(found.into_values().collect())
    }

    async fn commit(&self, transaction: Transaction) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let ids = touched_ids(&transaction.mutations)?;
        let mut documents = BTreeMap::new();
        for id in &ids {
            if let Some(document) = self.read_document(id).await? {
                documents.insert(id.clone(), document);
            }
        }

        apply_mutations(&mut documents, transaction.mutations)?;

        self.ensure_dir(&self.root).await?;
        let mut staged = Vec::new();
        let mut removed = Vec::new();
        for id in &ids {
            let path = self.document_path(id)?;
            let Some(document) = documents.get(id) else {
                removed.push(path);
                continue;
            };
            match self.stage(id, document).await {
                Ok(staging) => staged.push((staging, path)),
                Err(error) => {
                    for (staging, _) in &staged {
                        let _ = tokio::fs::remove_file(staging).await;
                    }
                    return Err(error);
                }
            }
        }

        for (staging, path) in staged {
            tokio::fs::rename(&staging, &path)
                .await
                .map_err(|source| StoreError::Io { path, source })?;
        }
        for path in removed {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Io { path, source }),
            }
        }
        tracing::debug!(documents = ids.len(), "committed transaction");
        Ok(())
    }

    async fn upload_asset(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<UploadedAsset, StoreError> {
        let filename = checked_name(filename)?;
        let id = asset_id(&bytes, mime_type);
        let dir = self.root.join("assets");
        self.ensure_dir(&dir).await?;

        let path = dir.join(format!("{id}-{filename}"));
        let size = bytes.len() as u64;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(UploadedAsset {
            url: format!("file://{}", path.display()),
            id,
            mime_type: mime_type.to_owned(),
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: serde_json::Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_promote_draft_in_one_commit() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());

        store
            .create(object(json!({ "_id": "drafts.p1", "_type": "post", "title": "Hi" })))
            .await
            .unwrap();

        let tx = Transaction::new()
            .create_if_not_exists(object(json!({ "_id": "p1", "_type": "post", "title": "Hi" })))
            .delete("drafts.p1");
        store.commit(tx).await.unwrap();

        assert!(store.get("drafts.p1").await.unwrap().is_none());
        let published = store.get("p1").await.unwrap().unwrap();
        assert_eq!(published["title"], "Hi");

        let posts = store.query(&DocumentQuery::of_type("post")).await.unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_transaction_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());

        let tx = Transaction::new()
            .create(object(json!({ "_id": "a" })))
            .patch("missing", Object::new());
        assert!(store.commit(tx).await.is_err());
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_staging_leaves_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        store
            .create(object(json!({ "_id": "b", "title": "old" })))
            .await
            .unwrap();
        // A directory squatting on the staging path makes the second write fail.
        std::fs::create_dir(dir.path().join(".c.json.tmp")).unwrap();

        let tx = Transaction::new()
            .create(object(json!({ "_id": "a" })))
            .patch("b", object(json!({ "title": "new" })))
            .create(object(json!({ "_id": "c" })));
        assert!(matches!(store.commit(tx).await, Err(StoreError::Io { .. })));

        assert!(store.get("a").await.unwrap().is_none());
        assert_eq!(store.get("b").await.unwrap().unwrap()["title"], "old");
        assert!(!dir.path().join(".a.json.tmp").exists());
        assert!(!dir.path().join(".b.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_names_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path().join("root"));

        for id in ["../escaped", "a/b", "a\\b", ""] {
            let err = store.create(object(json!({ "_id": id }))).await.unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidName { .. } | StoreError::MissingId),
                "{id}: {err:?}"
            );
        }
        assert!(!dir.path().join("escaped.json").exists());
        assert!(matches!(
            store.get("../escaped").await,
            Err(StoreError::InvalidName { .. })
        ));
        assert!(matches!(
            store.delete("../root/x").await,
            Err(StoreError::InvalidName { .. })
        ));

        let upload = store.upload_asset(vec![1], "../cover.png", "image/png").await;
        assert!(matches!(upload, Err(StoreError::InvalidName { .. })));
        assert!(!dir.path().join("root").join("cover.png").exists());

        store.create(object(json!({ "_id": "drafts.ok" }))).await.unwrap();
        assert!(store.get("drafts.ok").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_query_on_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path().join("nowhere"));
        assert!(store.query(&DocumentQuery::default()).await.unwrap().is_empty());
    }
}
