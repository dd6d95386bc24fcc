use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use std::fs::OpenOptions;
use std::path::Path;

pub fn init_cli_logging() {
    builder().target(Target::Stderr).init();
}

/// The TUI owns the terminal, so its log lines go to a file instead.
pub fn init_tui_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {:?}", path))?;
    builder().target(Target::Pipe(Box::new(file))).init();
    Ok(())
}

fn builder() -> Builder {
    let mut builder = Builder::new();
    builder
        .filter_level(if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env();
    builder
}
