//! Where HighPoint keeps its local files.

use std::path::{Path, PathBuf};

use crate::{CoreError, CoreResult};

const BASE_DIR_NAME: &str = ".highpoint";

/// Local file layout. Everything lives under one base directory,
/// `~/.highpoint` unless overridden:
///
/// ```text
/// config.json
/// chat_history.json
/// logs/dev.jsonl
/// ```
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir().ok_or(CoreError::NoHomeDir)?;
        Ok(Self::with_base_dir(home.join(BASE_DIR_NAME)))
    }

    /// Root the layout somewhere else (`--base-dir`, tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Conversation the `chat` command continues when no file is given.
    pub fn chat_history_file(&self) -> PathBuf {
        self.base_dir.join("chat_history.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.base_dir.join("logs").join("dev.jsonl")
    }

    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(self.base_dir.join("logs"))?;
        Ok(())
    }
}
