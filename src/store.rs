use crate::model::{
    Note, NoteChanges, NoteDraft, NoteFilter, NoteId, NoteWithTag, StoreError, Tag, TagId,
    TagWithCount,
};
use crate::styled::TextColor;
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::fs;
use std::path::Path;

pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub max_tag_count: usize,
    pub case_sensitive_search: bool,
    pub seed_default_tags: bool,
    pub default_tag_color: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            max_tag_count: 10,
            case_sensitive_search: true,
            seed_default_tags: true,
            default_tag_color: "#FF6B6B".into(),
        }
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    color TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    formattedContent TEXT NOT NULL,
    tagId INTEGER REFERENCES tags(id) ON DELETE SET NULL,
    createdDate INTEGER NOT NULL,
    modifiedDate INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS index_notes_tagId ON notes(tagId);
";

const DEFAULT_TAGS: [(&str, &str); 4] = [
    ("Work", "#FF6B6B"),
    ("Life", "#4ECDC4"),
    ("Study", "#45B7D1"),
    ("Personal", "#96CEB4"),
];

const NOTE_SELECT: &str = "SELECT n.id, n.title, n.content, n.formattedContent, n.tagId, \
     n.createdDate, n.modifiedDate FROM notes n";

const NOTE_WITH_TAG_SELECT: &str = "SELECT n.id, n.title, n.content, n.formattedContent, \
     n.tagId, n.createdDate, n.modifiedDate, t.name, t.color \
     FROM notes n LEFT JOIN tags t ON n.tagId = t.id";

pub struct NoteStore {
    conn: Connection,
    options: StoreOptions,
    clock: Clock,
}

impl NoteStore {
    pub fn open(path: &Path, options: StoreOptions) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!("opened note database at {}", path.display());
        Self::init(conn, options)
    }

    pub fn open_in_memory(options: StoreOptions) -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, options)
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    fn init(conn: Connection, options: StoreOptions) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'tags'",
            [],
            |row| row.get(0),
        )?;
        conn.execute_batch(SCHEMA)?;
        let mut store = NoteStore {
            conn,
            options,
            clock: Box::new(Utc::now),
        };
        if existing == 0 && store.options.seed_default_tags {
            store.seed_default_tags()?;
        }
        Ok(store)
    }

    fn seed_default_tags(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for (name, color) in DEFAULT_TAGS.iter().take(self.options.max_tag_count) {
            tx.execute(
                "INSERT INTO tags (name, color) VALUES (?1, ?2)",
                params![name, color],
            )?;
        }
        tx.commit()?;
        info!("seeded default tags into new database");
        Ok(())
    }

    pub fn create_note(&mut self, draft: &NoteDraft) -> Result<NoteId, StoreError> {
        let now = (self.clock)().timestamp_millis();
        let tx = self.conn.transaction()?;
        if let Some(tag_id) = draft.tag_id {
            ensure_tag(&tx, tag_id)?;
        }
        tx.execute(
            "INSERT INTO notes (title, content, formattedContent, tagId, createdDate, modifiedDate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                draft.title,
                draft.content,
                draft.formatted_content,
                draft.tag_id,
                now
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!("created note {}", id);
        Ok(id)
    }

    pub fn get_note(&self, id: NoteId) -> Result<Option<Note>, StoreError> {
        Ok(fetch_note(&self.conn, id)?)
    }

    pub fn get_note_with_tag(&self, id: NoteId) -> Result<Option<NoteWithTag>, StoreError> {
        let sql = format!("{} WHERE n.id = ?1", NOTE_WITH_TAG_SELECT);
        Ok(self
            .conn
            .query_row(&sql, params![id], note_with_tag_from_row)
            .optional()?)
    }

    /// Always refreshes the modification time, even when nothing changed.
    pub fn update_note(&mut self, id: NoteId, changes: &NoteChanges) -> Result<(), StoreError> {
        let now = (self.clock)();
        let tx = self.conn.transaction()?;
        let mut note = fetch_note(&tx, id)?.ok_or(StoreError::NoteNotFound(id))?;
        if let Some(title) = &changes.title {
            note.title = title.clone();
        }
        if let Some(content) = &changes.content {
            note.content = content.clone();
        }
        if let Some(formatted) = &changes.formatted_content {
            note.formatted_content = formatted.clone();
        }
        if let Some(tag_id) = changes.tag_id {
            if let Some(tag_id) = tag_id {
                ensure_tag(&tx, tag_id)?;
            }
            note.tag_id = tag_id;
        }
        note.modified_at = now.max(note.created_at);
        tx.execute(
            "UPDATE notes SET title = ?1, content = ?2, formattedContent = ?3, tagId = ?4,
             modifiedDate = ?5 WHERE id = ?6",
            params![
                note.title,
                note.content,
                note.formatted_content,
                note.tag_id,
                note.modified_at.timestamp_millis(),
                id
            ],
        )?;
        tx.commit()?;
        debug!("updated note {}", id);
        Ok(())
    }

    pub fn delete_note(&mut self, id: NoteId) -> Result<(), StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1", params![id])?;
        if removed == 0 {
            debug!("note {} already absent", id);
        } else {
            debug!("deleted note {}", id);
        }
        Ok(())
    }

    pub fn create_tag(&mut self, name: &str) -> Result<TagId, StoreError> {
        let color = self.options.default_tag_color.clone();
        self.create_tag_with_color(name, &color)
    }

    /// The count check and the insert share one immediate transaction.
    pub fn create_tag_with_color(&mut self, name: &str, color: &str) -> Result<TagId, StoreError> {
        let color: TextColor = color.parse()?;
        let max = self.options.max_tag_count;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let count: i64 = tx.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
        if count as usize >= max {
            info!("rejected tag {:?}: limit of {} reached", name, max);
            return Err(StoreError::TagLimitExceeded { max });
        }
        tx.execute(
            "INSERT INTO tags (name, color) VALUES (?1, ?2)",
            params![name, color.to_string()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!("created tag {} ({})", id, name);
        Ok(id)
    }

    pub fn get_tag(&self, id: TagId) -> Result<Option<Tag>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, color FROM tags WHERE id = ?1",
                params![id],
                tag_from_row,
            )
            .optional()?)
    }

    pub fn tag_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM tags ORDER BY name ASC, id ASC")?;
        let tags = stmt
            .query_map([], tag_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    pub fn update_tag(&mut self, id: TagId, new_name: &str) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE tags SET name = ?1 WHERE id = ?2",
            params![new_name, id],
        )?;
        if changed == 0 {
            return Err(StoreError::TagNotFound(id));
        }
        debug!("renamed tag {} to {:?}", id, new_name);
        Ok(())
    }

    pub fn recolor_tag(&mut self, id: TagId, color: &str) -> Result<(), StoreError> {
        let color: TextColor = color.parse()?;
        let changed = self.conn.execute(
            "UPDATE tags SET color = ?1 WHERE id = ?2",
            params![color.to_string(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::TagNotFound(id));
        }
        Ok(())
    }

    /// Untags every note referencing `id`, then removes the tag. Missing
    /// tags are not an error.
    pub fn delete_tag(&mut self, id: TagId) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let untagged = tx.execute(
            "UPDATE notes SET tagId = NULL WHERE tagId = ?1",
            params![id],
        )?;
        let removed = tx.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        tx.commit()?;
        if removed > 0 {
            info!("deleted tag {} and untagged {} note(s)", id, untagged);
        }
        Ok(())
    }

    /// Most recently modified first. An empty keyword matches nothing.
    pub fn list_notes(&self, filter: &NoteFilter) -> Result<Vec<NoteWithTag>, StoreError> {
        match filter {
            NoteFilter::All => self.query_notes("", []),
            NoteFilter::ByTag(tag_id) => self.query_notes("WHERE n.tagId = ?1", params![tag_id]),
            NoteFilter::ByKeyword(keyword) if keyword.is_empty() => Ok(Vec::new()),
            NoteFilter::ByKeyword(keyword) if self.options.case_sensitive_search => {
                self.query_notes("WHERE instr(n.title, ?1) > 0", params![keyword])
            }
            NoteFilter::ByKeyword(keyword) => self.query_notes(
                "WHERE n.title LIKE ?1 ESCAPE '\\'",
                params![like_pattern(keyword)],
            ),
        }
    }

    pub fn list_tags_with_counts(&self) -> Result<Vec<TagWithCount>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, t.color, COUNT(n.id)
             FROM tags t LEFT JOIN notes n ON n.tagId = t.id
             GROUP BY t.id
             ORDER BY t.name ASC, t.id ASC",
        )?;
        let tags = stmt
            .query_map([], |row| {
                let count: i64 = row.get(3)?;
                Ok(TagWithCount {
                    tag: tag_from_row(row)?,
                    note_count: count as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    fn query_notes<P: rusqlite::Params>(
        &self,
        clause: &str,
        params: P,
    ) -> Result<Vec<NoteWithTag>, StoreError> {
        let sql = format!(
            "{} {} ORDER BY n.modifiedDate DESC, n.id DESC",
            NOTE_WITH_TAG_SELECT, clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let notes = stmt
            .query_map(params, note_with_tag_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn ensure_tag(conn: &Connection, id: TagId) -> Result<(), StoreError> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM tags WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    found.map(|_| ()).ok_or(StoreError::TagNotFound(id))
}

fn fetch_note(conn: &Connection, id: NoteId) -> rusqlite::Result<Option<Note>> {
    let sql = format!("{} WHERE n.id = ?1", NOTE_SELECT);
    conn.query_row(&sql, params![id], note_from_row).optional()
}

fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        formatted_content: row.get(3)?,
        tag_id: row.get(4)?,
        created_at: timestamp(row, 5)?,
        modified_at: timestamp(row, 6)?,
    })
}

fn note_with_tag_from_row(row: &Row<'_>) -> rusqlite::Result<NoteWithTag> {
    Ok(NoteWithTag {
        note: note_from_row(row)?,
        tag_name: row.get(7)?,
        tag_color: row.get(8)?,
    })
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicI64, Ordering};

    pub(crate) fn ticking_clock() -> Clock {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let tick = AtomicI64::new(0);
        Box::new(move || base + Duration::seconds(tick.fetch_add(1, Ordering::SeqCst)))
    }

    pub(crate) fn test_options() -> StoreOptions {
        StoreOptions {
            seed_default_tags: false,
            ..StoreOptions::default()
        }
    }

    pub(crate) fn test_store() -> NoteStore {
        NoteStore::open_in_memory(test_options())
            .unwrap()
            .with_clock(ticking_clock())
    }

    fn draft(title: &str, tag_id: Option<TagId>) -> NoteDraft {
        NoteDraft {
            title: title.into(),
            content: format!("{} body", title),
            formatted_content: format!("<b>{}</b> body", title),
            tag_id,
        }
    }

    fn titles(notes: &[NoteWithTag]) -> Vec<&str> {
        notes.iter().map(|n| n.note.title.as_str()).collect()
    }

    fn assert_counts_match(store: &NoteStore) {
        let all = store.list_notes(&NoteFilter::All).unwrap();
        for entry in store.list_tags_with_counts().unwrap() {
            let expected = all
                .iter()
                .filter(|n| n.note.tag_id == Some(entry.tag.id))
                .count();
            assert_eq!(entry.note_count, expected, "tag {}", entry.tag.name);
        }
    }

    #[test]
    fn enables_foreign_keys() {
        let store = test_store();
        let enabled: i64 = store
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn deleting_tag_untags_its_notes() {
        let mut store = test_store();
        let work = store.create_tag("Work").unwrap();
        assert_eq!(work, 1);
        let plan = store.create_note(&draft("Plan", Some(work))).unwrap();
        store.create_note(&draft("Notes", None)).unwrap();

        let tagged = store.list_notes(&NoteFilter::ByTag(work)).unwrap();
        assert_eq!(titles(&tagged), vec!["Plan"]);
        assert_eq!(tagged[0].tag_name.as_deref(), Some("Work"));
        assert_eq!(tagged[0].tag_color.as_deref(), Some("#FF6B6B"));

        store.delete_tag(work).unwrap();
        assert!(store.list_notes(&NoteFilter::ByTag(work)).unwrap().is_empty());
        assert_eq!(store.get_note(plan).unwrap().unwrap().tag_id, None);
        assert!(store.list_tags_with_counts().unwrap().is_empty());

        let untagged = store.get_note_with_tag(plan).unwrap().unwrap();
        assert_eq!(untagged.tag_name, None);
    }

    #[test]
    fn delete_tag_untags_every_referencing_note() {
        let mut store = test_store();
        let home = store.create_tag("Home").unwrap();
        let keep = store.create_tag("Keep").unwrap();
        let ids: Vec<NoteId> = (0..5)
            .map(|i| store.create_note(&draft(&format!("n{i}"), Some(home))).unwrap())
            .collect();
        let other = store.create_note(&draft("other", Some(keep))).unwrap();

        store.delete_tag(home).unwrap();
        for id in ids {
            assert_eq!(store.get_note(id).unwrap().unwrap().tag_id, None);
        }
        assert_eq!(store.get_note(other).unwrap().unwrap().tag_id, Some(keep));
        let tags = store.list_tags_with_counts().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].tag.name, "Keep");

        store.delete_tag(home).unwrap();
    }

    #[test]
    fn tag_limit_is_enforced_at_creation() {
        let mut store = NoteStore::open_in_memory(StoreOptions {
            max_tag_count: 3,
            ..test_options()
        })
        .unwrap();
        store.create_tag("a").unwrap();
        store.create_tag("b").unwrap();
        assert_eq!(store.tag_count().unwrap(), 2);
        store.create_tag("c").unwrap();
        assert_eq!(store.tag_count().unwrap(), 3);

        let err = store.create_tag("d").unwrap_err();
        assert!(matches!(err, StoreError::TagLimitExceeded { max: 3 }));
        assert_eq!(store.tag_count().unwrap(), 3);

        store.delete_tag(1).unwrap();
        store.create_tag("d").unwrap();
    }

    #[test]
    fn counts_follow_every_mutation() {
        let mut store = test_store();
        let a = store.create_tag("Alpha").unwrap();
        let b = store.create_tag("Beta").unwrap();
        store.create_tag("Empty").unwrap();
        assert_counts_match(&store);

        let n1 = store.create_note(&draft("one", Some(a))).unwrap();
        let n2 = store.create_note(&draft("two", Some(a))).unwrap();
        let n3 = store.create_note(&draft("three", Some(b))).unwrap();
        assert_counts_match(&store);

        store
            .update_note(n1, &NoteChanges::default().with_tag(Some(b)))
            .unwrap();
        assert_counts_match(&store);
        store
            .update_note(n3, &NoteChanges::default().with_tag(None))
            .unwrap();
        assert_counts_match(&store);
        store.delete_note(n2).unwrap();
        assert_counts_match(&store);

        let counts: Vec<(String, usize)> = store
            .list_tags_with_counts()
            .unwrap()
            .into_iter()
            .map(|t| (t.tag.name, t.note_count))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("Alpha".to_string(), 0),
                ("Beta".to_string(), 1),
                ("Empty".to_string(), 0)
            ]
        );
    }

    #[test]
    fn lists_most_recently_modified_first() {
        let mut store = test_store();
        let first = store.create_note(&draft("first", None)).unwrap();
        store.create_note(&draft("second", None)).unwrap();
        store.create_note(&draft("third", None)).unwrap();
        assert_eq!(
            titles(&store.list_notes(&NoteFilter::All).unwrap()),
            vec!["third", "second", "first"]
        );

        store
            .update_note(first, &NoteChanges::default())
            .unwrap();
        assert_eq!(
            titles(&store.list_notes(&NoteFilter::All).unwrap()),
            vec!["first", "third", "second"]
        );
    }

    #[test]
    fn update_refreshes_modified_and_keeps_created() {
        let mut store = test_store();
        let id = store.create_note(&draft("Plan", None)).unwrap();
        let before = store.get_note(id).unwrap().unwrap();
        assert_eq!(before.created_at, before.modified_at);

        store
            .update_note(id, &NoteChanges::default().with_title("Plan v2"))
            .unwrap();
        let after = store.get_note(id).unwrap().unwrap();
        assert_eq!(after.title, "Plan v2");
        assert_eq!(after.content, before.content);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.modified_at > before.modified_at);
    }

    #[test]
    fn modified_never_precedes_created() {
        let past = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let mut store = test_store();
        let id = store.create_note(&draft("clock skew", None)).unwrap();
        let mut store = store.with_clock(Box::new(move || past));
        store.update_note(id, &NoteChanges::default()).unwrap();
        let note = store.get_note(id).unwrap().unwrap();
        assert!(note.modified_at >= note.created_at);
    }

    #[test]
    fn missing_ids_are_reported() {
        let mut store = test_store();
        assert!(matches!(
            store.update_note(42, &NoteChanges::default()),
            Err(StoreError::NoteNotFound(42))
        ));
        assert!(matches!(
            store.update_tag(7, "x"),
            Err(StoreError::TagNotFound(7))
        ));
        assert!(matches!(
            store.create_note(&draft("dangling", Some(9))),
            Err(StoreError::TagNotFound(9))
        ));
        store.delete_note(42).unwrap();
        store.delete_tag(7).unwrap();
        assert!(store.get_note(42).unwrap().is_none());
        assert!(store.get_tag(7).unwrap().is_none());
    }

    #[test]
    fn keyword_search_matches_titles_only() {
        let mut store = test_store();
        store.create_note(&draft("Weekly plan", None)).unwrap();
        store
            .create_note(&NoteDraft {
                title: "Groceries".into(),
                content: "plan dinner".into(),
                formatted_content: String::new(),
                tag_id: None,
            })
            .unwrap();
        store.create_note(&draft("Planning", None)).unwrap();

        let hits = store
            .list_notes(&NoteFilter::ByKeyword("plan".into()))
            .unwrap();
        assert_eq!(titles(&hits), vec!["Weekly plan"]);
        assert!(store
            .list_notes(&NoteFilter::ByKeyword(String::new()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn case_insensitive_search_escapes_wildcards() {
        let mut store = NoteStore::open_in_memory(StoreOptions {
            case_sensitive_search: false,
            ..test_options()
        })
        .unwrap()
        .with_clock(ticking_clock());
        store.create_note(&draft("Weekly PLAN", None)).unwrap();
        store.create_note(&draft("100% done", None)).unwrap();
        store.create_note(&draft("1000 done", None)).unwrap();

        let hits = store
            .list_notes(&NoteFilter::ByKeyword("plan".into()))
            .unwrap();
        assert_eq!(titles(&hits), vec!["Weekly PLAN"]);
        let hits = store
            .list_notes(&NoteFilter::ByKeyword("0%".into()))
            .unwrap();
        assert_eq!(titles(&hits), vec!["100% done"]);
    }

    #[test]
    fn tags_are_listed_by_name() {
        let mut store = test_store();
        store.create_tag_with_color("zeta", "#00ff00").unwrap();
        store.create_tag("alpha").unwrap();
        let names: Vec<String> = store.list_tags().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(store.get_tag(1).unwrap().unwrap().color, "#00FF00");
        assert!(matches!(
            store.create_tag_with_color("bad", "green"),
            Err(StoreError::InvalidColor(_))
        ));

        store.update_tag(2, "beta").unwrap();
        store.recolor_tag(2, "#123456").unwrap();
        let tag = store.get_tag(2).unwrap().unwrap();
        assert_eq!((tag.name.as_str(), tag.color.as_str()), ("beta", "#123456"));
    }

    #[test]
    fn seeds_default_tags_only_on_creation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notebook.db");
        {
            let mut store = NoteStore::open(&path, StoreOptions::default()).unwrap();
            assert_eq!(store.tag_count().unwrap(), 4);
            store.delete_tag(1).unwrap();
        }
        let store = NoteStore::open(&path, StoreOptions::default()).unwrap();
        assert_eq!(store.tag_count().unwrap(), 3);
        let names: Vec<String> = store.list_tags().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Life", "Personal", "Study"]);
    }
}
