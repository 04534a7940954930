use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::StoreError;

use super::{
    DocumentQuery, DocumentStore, Object, Transaction, UploadedAsset, apply_mutations, asset_id,
};

/// An in-process [`DocumentStore`].
///
/// Transactions are applied to a scratch copy under the lock and swapped in
/// only when every mutation succeeds. Failures can be injected with
/// [`fail_next`](Self::fail_next) to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, Object>>,
    assets: Mutex<BTreeMap<String, Vec<u8>>>,
    commits: AtomicUsize,
    failures: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` commits or uploads fail with [`StoreError::Unavailable`].
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored document, keyed by id.
    pub fn documents(&self) -> BTreeMap<String, Object> {
        self.lock_documents().clone()
    }

    pub fn asset_bytes(&self, id: &str) -> Option<Vec<u8>> {
        self.assets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    fn lock_documents(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Object>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            Err(StoreError::Unavailable("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Object>, StoreError> {
        Ok(self.lock_documents().get(id).cloned())
    }

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Object>, StoreError> {
        Ok(self
            .lock_documents()
            .values()
            .filter(|doc| query.matches(doc))
            .cloned()
            .collect())
    }

    async fn commit(&self, transaction: Transaction) -> Result<(), StoreError> {
        self.take_failure()?;
        let mut documents = self.lock_documents();
        let mut scratch = documents.clone();
        apply_mutations(&mut scratch, transaction.mutations)?;
        *documents = scratch;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upload_asset(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<UploadedAsset, StoreError> {
        self.take_failure()?;
        let id = asset_id(&bytes, mime_type);
        let asset = UploadedAsset {
            url: format!("memory://assets/{id}/{filename}"),
            id: id.clone(),
            mime_type: mime_type.to_owned(),
            size: bytes.len() as u64,
        };
        self.assets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, bytes);
        Ok(asset)
    }
}
