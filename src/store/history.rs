use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::timestamp_id;

pub const DEFAULT_MAX_ENTRIES: usize = 100;

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn cap_or_default(max_entries: usize) -> usize {
    if max_entries == 0 {
        DEFAULT_MAX_ENTRIES
    } else {
        max_entries
    }
}

fn deserialize_max_entries<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    usize::deserialize(deserializer).map(cap_or_default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Success,
    Failed,
}

/// One send attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentEmail {
    /// Assigned by [`History::record`] when left empty.
    #[serde(default)]
    pub id: String,
    pub from: String,
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    pub sent_at: DateTime<Utc>,
    /// Transport kind, e.g. `mailgun`.
    pub provider: String,
    pub provider_name: String,
    pub status: SendStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SentEmail {
    pub fn is_success(&self) -> bool {
        self.status == SendStatus::Success
    }
}

/// Send history, oldest first, capped at `max_entries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    emails: Vec<SentEmail>,
    /// Zero is read as [`DEFAULT_MAX_ENTRIES`].
    #[serde(default = "default_max_entries", deserialize_with = "deserialize_max_entries")]
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl History {
    /// A zero `max_entries` means [`DEFAULT_MAX_ENTRIES`].
    pub fn new(max_entries: usize) -> Self {
        Self {
            emails: Vec::new(),
            max_entries: cap_or_default(max_entries),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Change the cap, dropping the oldest entries if needed.
    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = cap_or_default(max_entries);
        self.trim_to(self.max_entries);
    }

    /// Append an entry, assigning an id if it has none, and drop the oldest
    /// entries beyond the cap.
    pub fn record(&mut self, mut email: SentEmail) -> &SentEmail {
        if email.id.is_empty() {
            email.id = timestamp_id(email.sent_at, |id| self.emails.iter().any(|e| e.id == id));
        }
        tracing::debug!(id = %email.id, status = ?email.status, "email added to history");
        // Make room first so the new entry is never the one evicted.
        self.trim_to(cap_or_default(self.max_entries) - 1);
        self.emails.push(email);
        let last = self.emails.len() - 1;
        &self.emails[last]
    }

    /// The `n` most recent entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<&SentEmail> {
        self.emails.iter().rev().take(n).collect()
    }

    /// Every entry, newest first.
    pub fn all(&self) -> Vec<&SentEmail> {
        self.recent(self.emails.len())
    }

    pub fn clear(&mut self) {
        self.emails.clear();
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Drop the oldest entries until at most `keep` remain.
    fn trim_to(&mut self, keep: usize) {
        if self.emails.len() > keep {
            let excess = self.emails.len() - keep;
            self.emails.drain(..excess);
        }
    }
}
