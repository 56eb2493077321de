//! On-disk locations of the template store, contact book and log file.

use std::path::{Path, PathBuf};

use crate::{MailglossError, Result};

const APP_DIR: &str = "mailgloss";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub dir: PathBuf,
    pub templates_file: PathBuf,
    pub contacts_file: PathBuf,
    pub log_file: PathBuf,
}

impl Paths {
    /// Lay out every file directly under `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            templates_file: dir.join("templates.json"),
            contacts_file: dir.join("contacts.json"),
            log_file: dir.join("mailgloss.log"),
            dir,
        }
    }

    /// `<platform config dir>/mailgloss`, e.g. `~/.config/mailgloss` on Linux.
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir().ok_or(MailglossError::NoConfigDir)?;
        Ok(Self::in_dir(base.join(APP_DIR)))
    }

    /// Create the directory (and parents) if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.dir).map_err(|e| MailglossError::Io {
            path: self.dir.clone(),
            source: e,
        })?;
        Ok(&self.dir)
    }
}
