use crate::dates::format_timestamp;
use crate::model::Note;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Plain-text rendering of a note, timestamps shown in `tz`.
pub fn render_export<Tz: TimeZone>(note: &Note, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "Title: {}\nCreated: {}\nModified: {}\n\nContent:\n{}",
        note.title,
        format_timestamp(&note.created_at.with_timezone(tz)),
        format_timestamp(&note.modified_at.with_timezone(tz)),
        note.body().text(),
    )
}

pub fn export_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("Note_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

/// Writes the note into `dir` as UTF-8 with a byte-order mark and returns the
/// path of the new file.
pub fn export_note<Tz: TimeZone>(note: &Note, dir: &Path, now: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;
    let path = dir.join(export_file_name(now));
    let body = render_export(note, &now.timezone());
    let mut bytes = Vec::with_capacity(BOM.len() + body.len());
    bytes.extend_from_slice(BOM);
    bytes.extend_from_slice(body.as_bytes());
    fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
