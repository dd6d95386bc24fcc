//! Live note feeds for the browsing and search views.
//!
//! A feed remembers its current criterion and republishes the matching notes
//! through a `watch` channel whenever the criterion changes or a refresh is
//! requested. Each run takes a generation number; results from a run that
//! was superseded before it finished are dropped.

use crate::handle::StoreHandle;
use crate::model::{NoteFilter, NoteWithTag, StoreError, TagId};
use log::debug;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct LiveQuery {
    shared: Arc<Shared>,
}

struct Shared {
    store: StoreHandle,
    filter: Mutex<NoteFilter>,
    generation: AtomicU64,
    tx: watch::Sender<Vec<NoteWithTag>>,
}

impl LiveQuery {
    pub fn new(store: StoreHandle, filter: NoteFilter) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        LiveQuery {
            shared: Arc::new(Shared {
                store,
                filter: Mutex::new(filter),
                generation: AtomicU64::new(0),
                tx,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<NoteWithTag>> {
        self.shared.tx.subscribe()
    }

    pub fn filter(&self) -> NoteFilter {
        self.shared.filter.lock().clone()
    }

    pub fn current(&self) -> Vec<NoteWithTag> {
        self.shared.tx.borrow().clone()
    }

    /// Switches to `filter` and republishes. Returns whether the result was
    /// published (false when a newer criterion arrived meanwhile).
    pub async fn set(&self, filter: NoteFilter) -> Result<bool, StoreError> {
        let generation = self.begin(filter.clone());
        self.execute(generation, filter).await
    }

    pub async fn refresh(&self) -> Result<bool, StoreError> {
        let filter = self.filter();
        let generation = self.begin(filter.clone());
        self.execute(generation, filter).await
    }

    async fn execute(&self, generation: u64, filter: NoteFilter) -> Result<bool, StoreError> {
        if let NoteFilter::ByKeyword(keyword) = &filter {
            if keyword.is_empty() {
                return Ok(self.finish(generation, Vec::new()));
            }
        }
        let notes = self.shared.store.list_notes(filter).await?;
        Ok(self.finish(generation, notes))
    }

    fn begin(&self, filter: NoteFilter) -> u64 {
        let mut current = self.shared.filter.lock();
        *current = filter;
        self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn finish(&self, generation: u64, notes: Vec<NoteWithTag>) -> bool {
        // Checked under the filter lock so a concurrent `begin` cannot slip in
        // between the comparison and the publish.
        let _guard = self.shared.filter.lock();
        if self.shared.generation.load(Ordering::SeqCst) != generation {
            debug!("dropping stale query result (generation {generation})");
            return false;
        }
        self.shared.tx.send_replace(notes);
        true
    }
}

/// Notes for the browsing view: everything, or one tag.
#[derive(Clone)]
pub struct NoteBrowser {
    feed: LiveQuery,
}

impl NoteBrowser {
    pub fn new(store: StoreHandle) -> Self {
        NoteBrowser {
            feed: LiveQuery::new(store, NoteFilter::All),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<NoteWithTag>> {
        self.feed.subscribe()
    }

    pub fn selected_tag(&self) -> Option<TagId> {
        match self.feed.filter() {
            NoteFilter::ByTag(id) => Some(id),
            _ => None,
        }
    }

    pub async fn select_tag(&self, tag: Option<TagId>) -> Result<bool, StoreError> {
        let filter = match tag {
            Some(id) => NoteFilter::ByTag(id),
            None => NoteFilter::All,
        };
        self.feed.set(filter).await
    }

    pub async fn refresh(&self) -> Result<bool, StoreError> {
        self.feed.refresh().await
    }
}

/// Notes for the search view. The keyword is trimmed; an empty keyword
/// yields an empty list without touching the store.
#[derive(Clone)]
pub struct NoteSearch {
    feed: LiveQuery,
}

impl NoteSearch {
    pub fn new(store: StoreHandle) -> Self {
        NoteSearch {
            feed: LiveQuery::new(store, NoteFilter::ByKeyword(String::new())),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<NoteWithTag>> {
        self.feed.subscribe()
    }

    pub fn keyword(&self) -> String {
        match self.feed.filter() {
            NoteFilter::ByKeyword(keyword) => keyword,
            _ => String::new(),
        }
    }

    pub async fn search(&self, keyword: &str) -> Result<bool, StoreError> {
        self.feed
            .set(NoteFilter::ByKeyword(keyword.trim().to_string()))
            .await
    }

    pub async fn refresh(&self) -> Result<bool, StoreError> {
        self.feed.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NoteDraft;
    use crate::store::tests::test_store;

    async fn seeded() -> (StoreHandle, TagId) {
        let handle = StoreHandle::new(test_store());
        let work = handle.create_tag("Work".into()).await.unwrap();
        for (title, tag) in [("Plan", Some(work)), ("Notes", None), ("Planning", None)] {
            handle
                .create_note(NoteDraft {
                    title: title.into(),
                    content: String::new(),
                    formatted_content: String::new(),
                    tag_id: tag,
                })
                .await
                .unwrap();
        }
        (handle, work)
    }

    fn titles(notes: &[NoteWithTag]) -> Vec<&str> {
        notes.iter().map(|n| n.note.title.as_str()).collect()
    }

    #[tokio::test]
    async fn browser_follows_tag_selection() {
        let (handle, work) = seeded().await;
        let browser = NoteBrowser::new(handle);
        let mut rx = browser.subscribe();

        assert!(browser.refresh().await.unwrap());
        assert!(rx.has_changed().unwrap());
        assert_eq!(titles(&rx.borrow_and_update()), ["Planning", "Notes", "Plan"]);

        browser.select_tag(Some(work)).await.unwrap();
        assert_eq!(browser.selected_tag(), Some(work));
        assert_eq!(titles(&rx.borrow_and_update()), ["Plan"]);

        browser.select_tag(None).await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 3);
    }

    #[tokio::test]
    async fn browser_refresh_sees_cascade() {
        let (handle, work) = seeded().await;
        let browser = NoteBrowser::new(handle.clone());
        browser.select_tag(Some(work)).await.unwrap();
        handle.delete_tag(work).await.unwrap();
        browser.refresh().await.unwrap();
        assert!(browser.subscribe().borrow().is_empty());
    }

    #[tokio::test]
    async fn empty_keyword_publishes_nothing_found() {
        let (handle, _) = seeded().await;
        let search = NoteSearch::new(handle);
        search.search("Plan").await.unwrap();
        assert_eq!(titles(&search.subscribe().borrow()), ["Planning", "Plan"]);

        search.search("   ").await.unwrap();
        assert_eq!(search.keyword(), "");
        assert!(search.subscribe().borrow().is_empty());
    }

    #[tokio::test]
    async fn search_trims_keyword() {
        let (handle, _) = seeded().await;
        let search = NoteSearch::new(handle);
        search.search("  Notes ").await.unwrap();
        assert_eq!(search.keyword(), "Notes");
        assert_eq!(titles(&search.subscribe().borrow()), ["Notes"]);
    }

    #[tokio::test]
    async fn superseded_results_are_dropped() {
        let (handle, work) = seeded().await;
        let feed = LiveQuery::new(handle, NoteFilter::All);
        let stale = feed.begin(NoteFilter::All);
        let latest = feed.begin(NoteFilter::ByTag(work));

        assert!(!feed.execute(stale, NoteFilter::All).await.unwrap());
        assert!(feed.current().is_empty());

        assert!(feed.execute(latest, NoteFilter::ByTag(work)).await.unwrap());
        assert_eq!(titles(&feed.current()), ["Plan"]);
        assert_eq!(feed.filter(), NoteFilter::ByTag(work));
    }
}
