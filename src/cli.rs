use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notebook", version, about = "Terminal notebook with tags and rich text")]
pub struct Cli {
    /// Config file (defaults to the per-user config.yml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Database file, overriding the configured one
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List notes, most recently modified first
    List {
        /// Only notes with this tag id
        #[arg(long, conflicts_with = "search")]
        tag: Option<i64>,
        /// Only notes whose title contains this keyword
        #[arg(long)]
        search: Option<String>,
        /// Print YAML instead of a table
        #[arg(long)]
        yaml: bool,
    },
    /// Show a single note
    Show {
        note_id: i64,
    },
    /// Add a new note
    Add {
        /// Title of the note
        title: String,
        /// Body as markup (<b>, <i>, <span style="color:#RRGGBB;">)
        #[arg(long)]
        body: Option<String>,
        /// Tag id
        #[arg(long)]
        tag: Option<i64>,
    },
    /// Edit an existing note
    Edit {
        note_id: i64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New body markup
        #[arg(long)]
        body: Option<String>,
        /// Set the tag id
        #[arg(long, conflicts_with = "clear_tag")]
        tag: Option<i64>,
        /// Remove the tag
        #[arg(long)]
        clear_tag: bool,
    },
    /// Delete a note
    Delete {
        note_id: i64,
    },
    /// Export a note as a text file
    Export {
        note_id: i64,
        /// Target directory (defaults to the configured export dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// List tags with note counts
    Tags {
        #[arg(long)]
        yaml: bool,
    },
    /// Manage tags
    Tag(TagArgs),
    /// Launch the interactive TUI
    Tui,
}

#[derive(Args, Debug)]
pub struct TagArgs {
    #[command(subcommand)]
    pub command: TagCommand,
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Create a tag
    Add {
        name: String,
        /// Hex color, e.g. #4ECDC4
        #[arg(long)]
        color: Option<String>,
    },
    /// Rename a tag
    Rename { tag_id: i64, name: String },
    /// Change a tag's color
    Color { tag_id: i64, color: String },
    /// Delete a tag; its notes become untagged
    Delete { tag_id: i64 },
}
