use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{load_json, save_json, timestamp_id};
use crate::address::{split_recipients, ParseError};
use crate::{MailglossError, Result};

/// Editable fields of a contact.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// `Name <email>`, or just the email when the contact has no name.
    pub fn display(&self) -> String {
        if self.name.is_empty() {
            self.email.clone()
        } else {
            format!("{} <{}>", self.name, self.email)
        }
    }

    /// Case-insensitive substring match on name or email.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.email.to_lowercase().contains(&query) || self.name.to_lowercase().contains(&query)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Append `contact` to a comma separated recipient field.
pub fn append_recipient(field: &str, contact: &Contact) -> String {
    let field = field.trim();
    if field.is_empty() {
        contact.display()
    } else {
        format!("{field}, {}", contact.display())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactBook {
    #[serde(default)]
    contacts: Vec<Contact>,
}

impl ContactBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the book from `path`. A missing file yields an empty book.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    /// Add a contact. The email must be a single valid address.
    pub fn add(&mut self, draft: ContactDraft) -> Result<&Contact> {
        validate_email(&draft.email)?;
        let now = Utc::now();
        let id = timestamp_id(now, |id| self.get(id).is_some());
        let contact = Contact {
            id,
            name: draft.name,
            email: draft.email,
            notes: draft.notes,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
        };
        tracing::info!(name = %contact.name, email = %contact.email, "contact added");
        self.contacts.push(contact);
        Ok(&self.contacts[self.contacts.len() - 1])
    }

    pub fn update(&mut self, id: &str, draft: ContactDraft) -> Result<&Contact> {
        validate_email(&draft.email)?;
        let Some(contact) = self.contacts.iter_mut().find(|c| c.id == id) else {
            tracing::warn!(id, "contact not found for update");
            return Err(not_found(id));
        };
        contact.name = draft.name;
        contact.email = draft.email;
        contact.notes = draft.notes;
        contact.tags = draft.tags;
        contact.updated_at = Utc::now();
        tracing::info!(name = %contact.name, email = %contact.email, "contact updated");
        Ok(contact)
    }

    pub fn delete(&mut self, id: &str) -> Result<Contact> {
        let Some(index) = self.contacts.iter().position(|c| c.id == id) else {
            tracing::warn!(id, "contact not found for deletion");
            return Err(not_found(id));
        };
        let removed = self.contacts.remove(index);
        tracing::info!(name = %removed.name, email = %removed.email, "contact deleted");
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn by_email(&self, email: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.email == email)
    }

    pub fn by_tag(&self, tag: &str) -> Vec<&Contact> {
        self.contacts.iter().filter(|c| c.has_tag(tag)).collect()
    }

    pub fn search(&self, query: &str) -> Vec<&Contact> {
        self.contacts.iter().filter(|c| c.matches(query)).collect()
    }

    pub fn all(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

fn validate_email(email: &str) -> Result<()> {
    let invalid = |source: ParseError| MailglossError::InvalidAddress {
        field: "email".to_string(),
        source,
    };
    let parsed = split_recipients(email).map_err(invalid)?;
    if parsed.len() != 1 {
        return Err(MailglossError::MissingField {
            field: "contact email".to_string(),
        });
    }
    Ok(())
}

fn not_found(id: &str) -> MailglossError {
    MailglossError::NotFound {
        kind: "contact",
        id: id.to_string(),
    }
}
