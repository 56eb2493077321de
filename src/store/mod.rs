//! In-memory stores for templates, contacts and send history.
//!
//! Templates and contacts are saved and loaded wholesale as pretty-printed
//! JSON; the history is a plain serde value the host persists itself.

mod contacts;
mod history;
mod templates;

pub use contacts::{append_recipient, Contact, ContactBook, ContactDraft};
pub use history::{History, SendStatus, SentEmail, DEFAULT_MAX_ENTRIES};
pub use templates::TemplateStore;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::{MailglossError, Result};

/// Serialize `value` to a pretty-printed JSON file at `path` (creates or overwrites).
pub(crate) fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| MailglossError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::to_writer_pretty(file, value).map_err(|e| MailglossError::StoreJson {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Deserialize a JSON file at `path`.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = std::fs::File::open(path).map_err(|e| MailglossError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| MailglossError::StoreJson {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Timestamp id (`YYYYMMDDhhmmss`), suffixed with `-N` while `taken` reports a clash.
pub(crate) fn timestamp_id(now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let base = now.format("%Y%m%d%H%M%S").to_string();
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
