//! Provider configuration, limits and the date layout for the `{{date}}`
//! system variable.
//!
//! These are plain serde types; reading and writing the config file is up to
//! the host application.

mod provider;

pub use provider::{
    MailgunConfig, PostalConfig, PostmarkConfig, ProviderConfig, ProviderTransport,
    SendGridConfig, SmtpConfig, SparkPostConfig,
};

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::{MailglossError, Result};

/// `DD.MM.YYYY`.
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

/// Size and count limits. A zero field means "use the default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub max_attachment_size_mb: u64,
    #[serde(default)]
    pub max_history_entries: usize,
    #[serde(default)]
    pub max_body_length: usize,
    #[serde(default)]
    pub max_emails_per_field: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_attachment_size_mb: 25,
            max_history_entries: 100,
            max_body_length: 10_000,
            max_emails_per_field: 500,
        }
    }
}

impl Limits {
    /// Copy of `self` with every zero field replaced by its default.
    pub fn effective(&self) -> Self {
        let defaults = Self::default();
        Self {
            max_attachment_size_mb: or_default(
                self.max_attachment_size_mb,
                defaults.max_attachment_size_mb,
            ),
            max_history_entries: or_default(self.max_history_entries, defaults.max_history_entries),
            max_body_length: or_default(self.max_body_length, defaults.max_body_length),
            max_emails_per_field: or_default(
                self.max_emails_per_field,
                defaults.max_emails_per_field,
            ),
        }
    }
}

fn or_default<T: PartialEq + Default>(value: T, default: T) -> T {
    if value == T::default() {
        default
    } else {
        value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    #[serde(default)]
    pub limits: Limits,
    /// chrono strftime layout used for `{{date}}`.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: None,
            limits: Limits::default(),
            date_format: default_date_format(),
        }
    }
}

impl Config {
    /// Check every provider, the default provider reference and the date layout.
    ///
    /// Each provider must be stored under its own name. A config without
    /// providers is valid.
    pub fn validate(&self) -> Result<()> {
        for (key, provider) in &self.providers {
            provider.validate().map_err(|e| match e {
                MailglossError::InvalidProvider { reason, .. } => MailglossError::InvalidProvider {
                    name: key.clone(),
                    reason,
                },
                other => other,
            })?;
            if provider.name != *key {
                return Err(MailglossError::InvalidProvider {
                    name: key.clone(),
                    reason: format!("name '{}' does not match its key", provider.name),
                });
            }
        }

        if let Some(name) = &self.default_provider {
            if !self.providers.contains_key(name) {
                return Err(MailglossError::UnknownDefaultProvider { name: name.clone() });
            }
        }

        if !is_valid_date_format(&self.date_format) {
            return Err(MailglossError::InvalidDateFormat {
                format: self.date_format.clone(),
            });
        }

        Ok(())
    }

    pub fn provider(&self, name: &str) -> Result<&ProviderConfig> {
        self.providers
            .get(name)
            .ok_or_else(|| MailglossError::UnknownProvider {
                name: name.to_string(),
            })
    }

    /// The default provider, if one is set and exists.
    pub fn default_provider_config(&self) -> Option<&ProviderConfig> {
        self.default_provider
            .as_deref()
            .and_then(|name| self.providers.get(name))
    }

    /// Add or replace a provider under its own name. The first provider added
    /// to an empty config becomes the default.
    pub fn add_provider(&mut self, provider: ProviderConfig) -> Result<()> {
        provider.validate()?;
        let name = provider.name.clone();
        self.providers.insert(name.clone(), provider);
        if self.providers.len() == 1 {
            self.default_provider = Some(name.clone());
        }
        tracing::info!(provider = %name, "provider saved");
        Ok(())
    }

    /// Remove a provider. If it was the default, the first remaining provider
    /// (by name) takes its place.
    pub fn remove_provider(&mut self, name: &str) -> Result<ProviderConfig> {
        let removed = self
            .providers
            .remove(name)
            .ok_or_else(|| MailglossError::UnknownProvider {
                name: name.to_string(),
            })?;
        if self.default_provider.as_deref() == Some(name) {
            self.default_provider = self.providers.keys().next().cloned();
        }
        tracing::info!(provider = %name, "provider removed");
        Ok(removed)
    }

    /// Provider names in sorted order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn limits(&self) -> Limits {
        self.limits.effective()
    }

    /// Format `now` with the configured layout, falling back to
    /// [`DEFAULT_DATE_FORMAT`] when the layout is invalid.
    pub fn format_date<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        if is_valid_date_format(&self.date_format) {
            let mut out = String::new();
            if write!(out, "{}", now.format(&self.date_format)).is_ok() {
                return out;
            }
        }
        now.format(DEFAULT_DATE_FORMAT).to_string()
    }
}

fn is_valid_date_format(layout: &str) -> bool {
    !layout.is_empty() && !StrftimeItems::new(layout).any(|item| matches!(item, Item::Error))
}
