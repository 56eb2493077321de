use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{load_json, save_json, timestamp_id};
use crate::template::{Template, TemplateDraft};
use crate::{MailglossError, Result};

/// Saved templates. `variables` on every stored template is derived here on
/// each add and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateStore {
    #[serde(default)]
    templates: Vec<Template>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from `path`. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no template file yet");
            return Ok(Self::default());
        }
        let store: Self = load_json(path)?;
        tracing::debug!(path = %path.display(), count = store.templates.len(), "templates loaded");
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    /// Create a template from `draft`, assigning its id and timestamps.
    pub fn add(&mut self, draft: TemplateDraft) -> &Template {
        let now = Utc::now();
        let id = timestamp_id(now, |id| self.get(id).is_some());
        let template = Template::create(id, draft, now);
        tracing::info!(id = %template.id, name = %template.name, variables = ?template.variables, "template added");
        self.templates.push(template);
        &self.templates[self.templates.len() - 1]
    }

    /// Replace the authored fields of template `id`, keeping its id and
    /// creation time.
    pub fn update(&mut self, id: &str, draft: TemplateDraft) -> Result<&Template> {
        let Some(template) = self.templates.iter_mut().find(|t| t.id == id) else {
            tracing::warn!(id, "template not found for update");
            return Err(not_found(id));
        };
        template.apply(draft, Utc::now());
        tracing::info!(id, name = %template.name, variables = ?template.variables, "template updated");
        Ok(template)
    }

    pub fn delete(&mut self, id: &str) -> Result<Template> {
        let Some(index) = self.templates.iter().position(|t| t.id == id) else {
            tracing::warn!(id, "template not found for deletion");
            return Err(not_found(id));
        };
        let removed = self.templates.remove(index);
        tracing::info!(id, name = %removed.name, "template deleted");
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn all(&self) -> &[Template] {
        &self.templates
    }

    pub fn by_tag(&self, tag: &str) -> Vec<&Template> {
        self.templates.iter().filter(|t| t.has_tag(tag)).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn not_found(id: &str) -> MailglossError {
    MailglossError::NotFound {
        kind: "template",
        id: id.to_string(),
    }
}
