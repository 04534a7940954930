//! The editor session: one open document, its block list, and auto-save.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use folio_common::store::ids::{draft_id, published_id};
use folio_common::{Config, DocumentStore};
use folio_editor_core::{
    Asset, AssetSlot, Block, BlockAction, BlockList, BlockPatch, ComponentKind, Direction,
    ImagePatch, ImageValue, SlugTracker, SmolStr, Span, UndoManager, execute_action,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::autosave::{self, Shared, Snapshot, SyncStatus};
use crate::document::{Access, Document, DocumentKind, Reference};
use crate::error::SyncError;
use crate::publish::publish_document;

/// Tunables for an [`EditorSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Quiet period before an auto-save.
    pub debounce: Duration,
    /// Undo steps kept for the body.
    pub undo_depth: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(2000),
            undo_depth: 100,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            debounce: config.autosave_debounce(),
            undo_depth: config.undo_depth,
        }
    }
}

/// An open document.
///
/// The session owns the in-memory document. Every tracked edit is handed to
/// a background auto-save task; [`save`](Self::save) and
/// [`publish`](Self::publish) write immediately. Dropping the session cancels
/// a pending auto-save, but a store call already running completes.
pub struct EditorSession<S: DocumentStore + 'static> {
    store: Arc<S>,
    document: Document,
    blocks: BlockList,
    slug: SlugTracker,
    shared: Arc<Shared>,
    changes: watch::Sender<Option<Arc<Snapshot>>>,
    autosave: JoinHandle<()>,
}

impl<S: DocumentStore + 'static> EditorSession<S> {
    /// Create a new draft in the store and open it.
    pub async fn start(
        store: Arc<S>,
        kind: DocumentKind,
        options: SessionOptions,
    ) -> Result<Self, SyncError> {
        let document = Document::new(kind);
        autosave::write_draft(store.as_ref(), &document).await?;
        tracing::info!(id = %document.id, %kind, "created draft");
        let saved = document.content_hash();
        Ok(Self::attach(store, document, Some(saved), options))
    }

    /// Open an existing document, preferring its draft over the published
    /// copy. Edits are always saved to the draft.
    pub async fn open(store: Arc<S>, id: &str, options: SessionOptions) -> Result<Self, SyncError> {
        let stored = match store.get(&draft_id(id)).await? {
            Some(draft) => draft,
            None => store
                .get(&published_id(id))
                .await?
                .ok_or_else(|| SyncError::NotFound { id: id.to_owned() })?,
        };
        let mut document = Document::from_object(stored)?;
        document.id = document.draft_id();
        tracing::debug!(id = %document.id, blocks = document.body.len(), "opened document");
        let saved = document.content_hash();
        Ok(Self::attach(store, document, Some(saved), options))
    }

    fn attach(
        store: Arc<S>,
        document: Document,
        last_saved: Option<folio_common::blake3::Hash>,
        options: SessionOptions,
    ) -> Self {
        let shared = Arc::new(Shared::new(last_saved));
        let (changes, receiver) = watch::channel(None);
        let autosave = autosave::spawn(store.clone(), shared.clone(), receiver, options.debounce);
        Self {
            blocks: BlockList::with_history_depth(document.body.clone(), options.undo_depth),
            slug: SlugTracker::resume(&document.title, &document.slug),
            store,
            document,
            shared,
            changes,
            autosave,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.blocks()
    }

    pub fn status(&self) -> SyncStatus {
        self.shared.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.shared.status.subscribe()
    }

    /// Key of the block that should take focus after a split.
    pub fn pending_focus(&self) -> Option<&str> {
        self.blocks.pending_focus()
    }

    pub fn take_pending_focus(&mut self) -> Option<SmolStr> {
        self.blocks.take_pending_focus()
    }

    // Tracked fields

    /// Set the title, re-deriving the slug unless it was taken over by hand.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if title == self.document.title {
            return;
        }
        self.document.slug = self.slug.on_title_changed(&title).to_owned();
        self.document.title = title;
        self.touch();
    }

    pub fn set_slug(&mut self, slug: impl Into<String>) {
        let slug = slug.into();
        self.slug.on_slug_edited(slug.clone());
        if slug != self.document.slug {
            self.document.slug = slug;
            self.touch();
        }
    }

    pub fn set_excerpt(&mut self, excerpt: impl Into<String>) {
        let excerpt = excerpt.into();
        if excerpt != self.document.excerpt {
            self.document.excerpt = excerpt;
            self.touch();
        }
    }

    pub fn set_featured_image(&mut self, image: Option<ImageValue>) {
        if image != self.document.featured_image {
            self.document.featured_image = image;
            self.touch();
        }
    }

    pub fn set_authors(&mut self, authors: Vec<Reference>) {
        if authors != self.document.authors {
            self.document.authors = authors;
            self.touch();
        }
    }

    pub fn set_tags(&mut self, tags: Vec<Reference>) {
        if tags != self.document.tags {
            self.document.tags = tags;
            self.touch();
        }
    }

    pub fn set_access(&mut self, access: Access) {
        if access != self.document.access {
            self.document.access = access;
            self.touch();
        }
    }

    // Body

    pub fn update_block(&mut self, key: &str, patch: BlockPatch) -> bool {
        let changed = self.blocks.update_block(key, patch);
        self.body_edited(changed)
    }

    pub fn delete_block(&mut self, key: &str) -> bool {
        let changed = self.blocks.delete_block(key);
        self.body_edited(changed)
    }

    pub fn add_component(&mut self, kind: ComponentKind, after_index: Option<usize>) -> SmolStr {
        let key = self.blocks.add_component(kind, after_index);
        self.body_edited(true);
        key
    }

    pub fn split_block_on_enter(
        &mut self,
        key: &str,
        before: Vec<Span>,
        after: Vec<Span>,
    ) -> Option<SmolStr> {
        let new_key = self.blocks.split_block_on_enter(key, before, after);
        self.body_edited(new_key.is_some());
        new_key
    }

    pub fn move_block(&mut self, key: &str, direction: Direction) -> bool {
        let changed = self.blocks.move_block(key, direction);
        self.body_edited(changed)
    }

    /// Replace the whole body, e.g. after a paste of many blocks.
    pub fn set_body(&mut self, blocks: Vec<Block>) {
        self.blocks.replace_all(blocks);
        self.body_edited(true);
    }

    pub fn apply(&mut self, action: &BlockAction) -> bool {
        let changed = execute_action(&mut self.blocks, action);
        self.body_edited(changed)
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.blocks.undo();
        self.body_edited(changed)
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.blocks.redo();
        self.body_edited(changed)
    }

    // Assets

    /// Upload an image and make it the featured image, keeping alt text and
    /// caption.
    pub async fn upload_featured_image(
        &mut self,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<Asset, SyncError> {
        let asset = self.upload(bytes, filename, mime_type).await?;
        let mut image = self.document.featured_image.clone().unwrap_or_default();
        image.asset = Some(AssetSlot::Expanded(asset.clone()));
        self.set_featured_image(Some(image));
        Ok(asset)
    }

    /// Upload an image into the image block with `key`. Returns `Ok(None)`
    /// without uploading when no such image block exists.
    pub async fn upload_image_block(
        &mut self,
        key: &str,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<Option<Asset>, SyncError> {
        let Some(Block::Image(block)) = self.blocks.get(key) else {
            return Ok(None);
        };
        let mut image = block.image.clone();

        let asset = self.upload(bytes, filename, mime_type).await?;
        image.asset = Some(AssetSlot::Expanded(asset.clone()));
        self.update_block(
            key,
            BlockPatch::Image(ImagePatch {
                image: Some(image),
                ..ImagePatch::default()
            }),
        );
        Ok(Some(asset))
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<Asset, SyncError> {
        let uploaded = self.store.upload_asset(bytes, filename, mime_type).await?;
        tracing::debug!(asset = %uploaded.id, size = uploaded.size, "uploaded asset");
        Ok(Asset {
            id: uploaded.id,
            url: uploaded.url,
            mime_type: Some(uploaded.mime_type),
        })
    }

    // Persistence

    /// Validate and write the draft now, waiting for any auto-save in flight.
    pub async fn save(&mut self) -> Result<(), SyncError> {
        self.document.validate()?;
        let hash = self.document.content_hash();
        let mut state = self.shared.gate.lock().await;
        autosave::write_draft(self.store.as_ref(), &self.document).await?;
        state.last_saved = Some(hash);
        tracing::info!(id = %self.document.id, "saved draft");
        Ok(())
    }

    /// Validate and publish. The draft is deleted by the same transaction.
    pub async fn publish(&mut self) -> Result<DateTime<Utc>, SyncError> {
        self.document.validate()?;
        let hash = self.document.content_hash();
        let mut state = self.shared.gate.lock().await;
        let published_at = publish_document(self.store.as_ref(), &self.document).await?;
        self.document.published_at = Some(published_at);
        state.last_saved = Some(hash);
        Ok(published_at)
    }

    /// Delete the stored draft. The in-memory document is kept, and the
    /// next edit writes a new draft.
    pub async fn discard_draft(&mut self) -> Result<(), SyncError> {
        let mut state = self.shared.gate.lock().await;
        self.store.delete(&self.document.draft_id()).await?;
        state.last_saved = None;
        tracing::info!(id = %self.document.id, "discarded draft");
        Ok(())
    }

    /// Stop auto-saving. A pending debounce is cancelled; a write already in
    /// flight is awaited.
    pub async fn shutdown(self) {
        let Self {
            changes, autosave, ..
        } = self;
        drop(changes);
        if let Err(error) = autosave.await {
            tracing::warn!(%error, "auto-save task ended abnormally");
        }
    }

    fn body_edited(&mut self, changed: bool) -> bool {
        if changed {
            self.document.body = self.blocks.blocks().to_vec();
            self.touch();
        }
        changed
    }

    fn touch(&mut self) {
        self.shared.mark_pending();
        self.changes
            .send_replace(Some(Arc::new(Snapshot::of(&self.document))));
    }
}
