//! Shared, non-blocking access to the [`NoteStore`].
//!
//! Every call runs on tokio's blocking pool; the caller only awaits the
//! completion. Calls are never retried.

use crate::model::{
    Note, NoteChanges, NoteDraft, NoteFilter, NoteId, NoteWithTag, StoreError, Tag, TagId,
    TagWithCount,
};
use crate::store::NoteStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::spawn_blocking;

#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Mutex<NoteStore>>,
    max_tag_count: usize,
}

impl StoreHandle {
    pub fn new(store: NoteStore) -> Self {
        StoreHandle {
            max_tag_count: store.options().max_tag_count,
            inner: Arc::new(Mutex::new(store)),
        }
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut NoteStore) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        spawn_blocking(move || {
            let mut store = inner.lock();
            f(&mut store)
        })
        .await?
    }

    pub async fn create_note(&self, draft: NoteDraft) -> Result<NoteId, StoreError> {
        self.run(move |store| store.create_note(&draft)).await
    }

    pub async fn get_note(&self, id: NoteId) -> Result<Option<Note>, StoreError> {
        self.run(move |store| store.get_note(id)).await
    }

    pub async fn get_note_with_tag(&self, id: NoteId) -> Result<Option<NoteWithTag>, StoreError> {
        self.run(move |store| store.get_note_with_tag(id)).await
    }

    pub async fn update_note(&self, id: NoteId, changes: NoteChanges) -> Result<(), StoreError> {
        self.run(move |store| store.update_note(id, &changes)).await
    }

    pub async fn delete_note(&self, id: NoteId) -> Result<(), StoreError> {
        self.run(move |store| store.delete_note(id)).await
    }

    pub async fn create_tag(&self, name: String) -> Result<TagId, StoreError> {
        self.run(move |store| store.create_tag(&name)).await
    }

    pub async fn create_tag_with_color(
        &self,
        name: String,
        color: String,
    ) -> Result<TagId, StoreError> {
        self.run(move |store| store.create_tag_with_color(&name, &color))
            .await
    }

    pub async fn get_tag(&self, id: TagId) -> Result<Option<Tag>, StoreError> {
        self.run(move |store| store.get_tag(id)).await
    }

    pub async fn tag_count(&self) -> Result<usize, StoreError> {
        self.run(|store| store.tag_count()).await
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        self.run(|store| store.list_tags()).await
    }

    pub async fn update_tag(&self, id: TagId, new_name: String) -> Result<(), StoreError> {
        self.run(move |store| store.update_tag(id, &new_name)).await
    }

    pub async fn recolor_tag(&self, id: TagId, color: String) -> Result<(), StoreError> {
        self.run(move |store| store.recolor_tag(id, &color)).await
    }

    pub async fn delete_tag(&self, id: TagId) -> Result<(), StoreError> {
        self.run(move |store| store.delete_tag(id)).await
    }

    pub async fn list_notes(&self, filter: NoteFilter) -> Result<Vec<NoteWithTag>, StoreError> {
        self.run(move |store| store.list_notes(&filter)).await
    }

    pub async fn list_tags_with_counts(&self) -> Result<Vec<TagWithCount>, StoreError> {
        self.run(|store| store.list_tags_with_counts()).await
    }

    /// Read without the store lock, so render code can call it while a
    /// worker holds the store.
    pub fn max_tag_count(&self) -> usize {
        self.max_tag_count
    }
}
