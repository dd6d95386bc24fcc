use crate::store::StoreOptions;
use anyhow::{Context, Result};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub database: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub max_tag_count: usize,
    pub max_title_length: usize,
    pub case_sensitive_search: bool,
    pub seed_default_tags: bool,
    pub default_tag_color: String,
}

impl Default for Config {
    fn default() -> Self {
        let store = StoreOptions::default();
        Config {
            database: None,
            export_dir: None,
            max_tag_count: store.max_tag_count,
            max_title_length: 20,
            case_sensitive_search: store.case_sensitive_search,
            seed_default_tags: store.seed_default_tags,
            default_tag_color: store.default_tag_color,
        }
    }
}

impl Config {
    /// Reads `explicit` if given, otherwise the per-user config file. A
    /// missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Config::default()),
            },
        };
        let data = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
        Self::parse(&data).with_context(|| format!("parsing config file {:?}", path))
    }

    pub fn parse(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(data)?;
        config
            .default_tag_color
            .parse::<crate::styled::TextColor>()
            .context("default_tag_color")?;
        Ok(config)
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("notebook.db")),
        }
    }

    pub fn export_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.export_dir {
            return Ok(dir.clone());
        }
        if let Some(documents) = UserDirs::new().and_then(|u| u.document_dir().map(Path::to_path_buf))
        {
            return Ok(documents);
        }
        Ok(project_dirs()?.data_dir().join("exports"))
    }

    /// Log file for the TUI, kept next to the database.
    pub fn log_path(&self) -> Result<PathBuf> {
        let db = self.database_path()?;
        Ok(db
            .parent()
            .map(|dir| dir.join("notebook.log"))
            .unwrap_or_else(|| PathBuf::from("notebook.log")))
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            max_tag_count: self.max_tag_count,
            case_sensitive_search: self.case_sensitive_search,
            seed_default_tags: self.seed_default_tags,
            default_tag_color: self.default_tag_color.clone(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "notebook").context("locating data directory")
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "notebook").map(|dirs| dirs.config_dir().join("config.yml"))
}
