use crate::ui;
use notebook::config::Config;
use notebook::dates::format_relative;
use notebook::export::export_note;
use notebook::markup;
use notebook::model::{NoteChanges, NoteDraft, NoteFilter, NoteWithTag, StoreError, TagId};
use notebook::store::NoteStore;
use notebook::styled::StyledText;
use anyhow::{bail, Context, Result};
use chrono::Local;
use log::{info, warn};
use std::path::PathBuf;

pub fn list(config: &Config, tag: Option<TagId>, search: Option<String>, yaml: bool) -> Result<()> {
    let store = open_store(config)?;
    let filter = match (tag, search) {
        (Some(id), _) => NoteFilter::ByTag(id),
        (None, Some(keyword)) => NoteFilter::ByKeyword(keyword.trim().to_string()),
        (None, None) => NoteFilter::All,
    };
    let notes = store.list_notes(&filter)?;
    if yaml {
        print!("{}", serde_yaml::to_string(&notes).context("serializing notes")?);
        return Ok(());
    }
    if notes.is_empty() {
        println!("(no notes)");
    }
    for note in &notes {
        print_note_line(note);
    }
    Ok(())
}

pub fn show(config: &Config, note_id: i64) -> Result<()> {
    let store = open_store(config)?;
    let Some(entry) = store.get_note_with_tag(note_id)? else {
        bail!(StoreError::NoteNotFound(note_id));
    };
    let now = Local::now();
    println!("{}: {}", entry.note.id, entry.note.title);
    if let Some(tag) = &entry.tag_name {
        println!("  tag: {}", tag);
    }
    println!(
        "  created: {}",
        format_relative(&entry.note.created_at.with_timezone(&Local), &now)
    );
    println!(
        "  modified: {}",
        format_relative(&entry.note.modified_at.with_timezone(&Local), &now)
    );
    println!();
    println!("{}", entry.note.body().text());
    Ok(())
}

pub fn add(config: &Config, title: String, body: Option<String>, tag: Option<TagId>) -> Result<()> {
    let title = validate_title(&title, config.max_title_length)?;
    let body = parse_body(body.as_deref().unwrap_or(""));
    let mut store = open_store(config)?;
    let id = store
        .create_note(&NoteDraft::new(title, &body, tag))
        .context("creating note")?;
    println!("Added note {}", id);
    Ok(())
}

pub fn edit(
    config: &Config,
    note_id: i64,
    title: Option<String>,
    body: Option<String>,
    tag: Option<TagId>,
    clear_tag: bool,
) -> Result<()> {
    let mut changes = NoteChanges::default();
    if let Some(t) = title {
        changes = changes.with_title(validate_title(&t, config.max_title_length)?);
    }
    if let Some(b) = body {
        changes = changes.with_body(&parse_body(&b));
    }
    if clear_tag {
        changes = changes.with_tag(None);
    } else if tag.is_some() {
        changes = changes.with_tag(tag);
    }
    let mut store = open_store(config)?;
    store
        .update_note(note_id, &changes)
        .with_context(|| format!("updating note {}", note_id))?;
    println!("Updated note {}", note_id);
    Ok(())
}

pub fn delete(config: &Config, note_id: i64) -> Result<()> {
    let mut store = open_store(config)?;
    store.delete_note(note_id)?;
    println!("Deleted note {}", note_id);
    Ok(())
}

pub fn export(config: &Config, note_id: i64, dir: Option<PathBuf>) -> Result<()> {
    let store = open_store(config)?;
    let Some(note) = store.get_note(note_id)? else {
        bail!(StoreError::NoteNotFound(note_id));
    };
    let dir = match dir {
        Some(d) => d,
        None => config.export_dir()?,
    };
    match export_note(&note, &dir, &Local::now()) {
        Ok(path) => {
            info!("exported note {} to {}", note_id, path.display());
            println!("Exported note {} to {}", note_id, path.display());
            Ok(())
        }
        Err(err) => {
            warn!("export of note {} failed: {:#}", note_id, err);
            Err(err.context(format!("exporting note {}", note_id)))
        }
    }
}

pub fn tags(config: &Config, yaml: bool) -> Result<()> {
    let store = open_store(config)?;
    let tags = store.list_tags_with_counts()?;
    if yaml {
        print!("{}", serde_yaml::to_string(&tags).context("serializing tags")?);
        return Ok(());
    }
    if tags.is_empty() {
        println!("(no tags)");
    }
    for entry in &tags {
        println!(
            "  {:>3}  {:<12} {}  {} note(s)",
            entry.tag.id, entry.tag.name, entry.tag.color, entry.note_count
        );
    }
    Ok(())
}

pub fn tag_add(config: &Config, name: String, color: Option<String>) -> Result<()> {
    let name = validate_tag_name(&name)?;
    let mut store = open_store(config)?;
    let id = match color {
        Some(c) => store.create_tag_with_color(&name, &c)?,
        None => store.create_tag(&name)?,
    };
    println!("Added tag {} ({})", name, id);
    Ok(())
}

pub fn tag_rename(config: &Config, tag_id: TagId, name: String) -> Result<()> {
    let name = validate_tag_name(&name)?;
    let mut store = open_store(config)?;
    store.update_tag(tag_id, &name)?;
    println!("Renamed tag {} to {}", tag_id, name);
    Ok(())
}

pub fn tag_color(config: &Config, tag_id: TagId, color: String) -> Result<()> {
    let mut store = open_store(config)?;
    store.recolor_tag(tag_id, &color)?;
    println!("Recolored tag {}", tag_id);
    Ok(())
}

pub fn tag_delete(config: &Config, tag_id: TagId) -> Result<()> {
    let mut store = open_store(config)?;
    store.delete_tag(tag_id)?;
    println!("Deleted tag {}", tag_id);
    Ok(())
}

pub fn tui(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    ui::run(store, config)
}

/// Trims the title and checks it against the configured length cap.
pub fn validate_title(title: &str, max_len: usize) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        bail!("title must not be empty");
    }
    if trimmed.chars().count() > max_len {
        bail!("title is longer than {} characters", max_len);
    }
    Ok(trimmed.to_string())
}

pub fn validate_tag_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("tag name must not be empty");
    }
    Ok(trimmed.to_string())
}

/// Decodes user-supplied markup so the stored form is canonical.
pub fn parse_body(markup_text: &str) -> StyledText {
    let decoded = markup::decode(markup_text);
    if decoded.is_degraded() {
        info!("body markup contained unsupported tags; kept their text");
    }
    decoded.text
}

fn open_store(config: &Config) -> Result<NoteStore> {
    let path = config.database_path()?;
    NoteStore::open(&path, config.store_options())
        .with_context(|| format!("opening database {}", path.display()))
}

fn print_note_line(entry: &NoteWithTag) {
    let modified = format_relative(
        &entry.note.modified_at.with_timezone(&Local),
        &Local::now(),
    );
    let tag = entry.tag_name.as_deref().unwrap_or("-");
    println!(
        "  {:>4}  {:<20}  {:<12}  {}",
        entry.note.id, entry.note.title, tag, modified
    );
}
