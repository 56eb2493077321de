use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extract::extract_variables;

/// User-authored part of a template. Everything else on [`Template`] is derived.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub name: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    /// Placeholder names found in `subject` and `body`, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    pub(crate) fn create(id: String, draft: TemplateDraft, now: DateTime<Utc>) -> Self {
        let mut template = Self {
            id,
            name: String::new(),
            subject: String::new(),
            body: String::new(),
            variables: Vec::new(),
            tags: Vec::new(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        };
        template.apply(draft, now);
        template
    }

    /// Replace the authored fields and recompute `variables`. `id` and
    /// `created_at` are left alone.
    pub(crate) fn apply(&mut self, draft: TemplateDraft, now: DateTime<Utc>) {
        self.variables = extract_variables(&[draft.subject.as_str(), draft.body.as_str()]);
        self.name = draft.name;
        self.subject = draft.subject;
        self.body = draft.body;
        self.tags = draft.tags;
        self.description = draft.description;
        self.updated_at = now;
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
