use crate::markup;
use crate::styled::{ColorParseError, StyledText};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type NoteId = i64;
pub type TagId = i64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub formatted_content: String,
    pub tag_id: Option<TagId>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

/// A note joined with the name and color of its tag, if it has one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NoteWithTag {
    #[serde(flatten)]
    pub note: Note,
    pub tag_name: Option<String>,
    pub tag_color: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TagWithCount {
    #[serde(flatten)]
    pub tag: Tag,
    pub note_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteFilter {
    All,
    ByTag(TagId),
    ByKeyword(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub formatted_content: String,
    pub tag_id: Option<TagId>,
}

/// Fields to overwrite on update. `tag_id: Some(None)` clears the tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub formatted_content: Option<String>,
    pub tag_id: Option<Option<TagId>>,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("note not found: {0}")]
    NoteNotFound(NoteId),
    #[error("tag not found: {0}")]
    TagNotFound(TagId),
    #[error("tag limit reached (at most {max} tags)")]
    TagLimitExceeded { max: usize },
    #[error(transparent)]
    InvalidColor(#[from] ColorParseError),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl NoteWithTag {
    pub fn to_note(&self) -> Note {
        self.note.clone()
    }
}

impl Note {
    /// Styled body decoded from the stored markup, falling back to the plain
    /// content when no markup was saved.
    pub fn body(&self) -> StyledText {
        if self.formatted_content.is_empty() {
            StyledText::new(self.content.clone())
        } else {
            markup::decode(&self.formatted_content).text
        }
    }
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, body: &StyledText, tag_id: Option<TagId>) -> Self {
        NoteDraft {
            title: title.into(),
            content: body.text().to_string(),
            formatted_content: markup::encode(body),
            tag_id,
        }
    }
}

impl NoteChanges {
    pub fn with_body(mut self, body: &StyledText) -> Self {
        self.content = Some(body.text().to_string());
        self.formatted_content = Some(markup::encode(body));
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_tag(mut self, tag_id: Option<TagId>) -> Self {
        self.tag_id = Some(tag_id);
        self
    }
}
