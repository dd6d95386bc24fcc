mod cli;
mod commands;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::{Command, TagCommand};
use notebook::config::Config;
use notebook::logging;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(db) = args.db {
        config.database = Some(db);
    }
    let command = args.command.unwrap_or(Command::Tui);
    if matches!(command, Command::Tui) {
        logging::init_tui_logging(&config.log_path()?)?;
    } else {
        logging::init_cli_logging();
    }
    match command {
        Command::List { tag, search, yaml } => commands::list(&config, tag, search, yaml),
        Command::Show { note_id } => commands::show(&config, note_id),
        Command::Add { title, body, tag } => commands::add(&config, title, body, tag),
        Command::Edit {
            note_id,
            title,
            body,
            tag,
            clear_tag,
        } => commands::edit(&config, note_id, title, body, tag, clear_tag),
        Command::Delete { note_id } => commands::delete(&config, note_id),
        Command::Export { note_id, dir } => commands::export(&config, note_id, dir),
        Command::Tags { yaml } => commands::tags(&config, yaml),
        Command::Tag(args) => match args.command {
            TagCommand::Add { name, color } => commands::tag_add(&config, name, color),
            TagCommand::Rename { tag_id, name } => commands::tag_rename(&config, tag_id, name),
            TagCommand::Color { tag_id, color } => commands::tag_color(&config, tag_id, color),
            TagCommand::Delete { tag_id } => commands::tag_delete(&config, tag_id),
        },
        Command::Tui => commands::tui(&config),
    }
}
