//! Compose pipeline: form validation, template values, message build, transport
//! hand-off and history bookkeeping.
//!
//! The crate never talks to a mail server itself. Hosts plug a [`Transport`]
//! into [`MailService`] and receive a fully built [`Message`] per send.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use lettre::Message;

use crate::address::{parse_from, split_recipients, ParseError};
use crate::config::{Config, ProviderConfig};
use crate::message::{build_message, OutgoingEmail};
use crate::store::{History, SendStatus, SentEmail};
use crate::template::{render_template, system_variables, Template, VariableValues};
use crate::{MailglossError, Result};

/// Delivers a built message through a configured provider.
pub trait Transport {
    fn send(&self, provider: &ProviderConfig, message: &Message) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, provider: &ProviderConfig, message: &Message) -> Result<()> {
        (**self).send(provider, message)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, provider: &ProviderConfig, message: &Message) -> Result<()> {
        (**self).send(provider, message)
    }
}

/// The compose form as the user filled it in. Recipient fields are comma
/// separated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposeForm {
    /// Provider name; `None` or empty selects the configured default.
    pub provider: Option<String>,
    pub from: String,
    pub to: String,
    pub cc: String,
    pub bcc: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

/// A form that passed validation, bound to its provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEmail {
    pub provider: ProviderConfig,
    pub email: OutgoingEmail,
}

impl PreparedEmail {
    /// Sender as recorded in history: `Name <addr>` or the bare address.
    pub fn from_display(&self) -> String {
        let (address, name) = self.email.sender(&self.provider);
        if name.is_empty() {
            address
        } else {
            format!("{name} <{address}>")
        }
    }
}

pub struct MailService<T> {
    config: Config,
    transport: T,
}

impl<T: Transport> MailService<T> {
    /// Wrap a validated `config` and the transport that will carry messages.
    pub fn new(config: Config, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// An empty history sized by the configured limits.
    pub fn new_history(&self) -> History {
        History::new(self.config.limits().max_history_entries)
    }

    /// The provider named by `name`, or the default provider when `name` is
    /// absent or empty.
    pub fn resolve_provider(&self, name: Option<&str>) -> Result<&ProviderConfig> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => self.config.provider(name),
            None => {
                let name = self
                    .config
                    .default_provider
                    .as_deref()
                    .ok_or(MailglossError::NoProviderSelected)?;
                self.config.provider(name)
            }
        }
    }

    /// Validate `form` and resolve it against its provider.
    pub fn prepare(&self, form: &ComposeForm) -> Result<PreparedEmail> {
        let provider = self.resolve_provider(form.provider.as_deref())?;
        provider.validate()?;
        let limits = self.config.limits();

        let from = parse_from(&form.from, provider.domain()).map_err(|source| {
            MailglossError::InvalidAddress {
                field: "From".to_string(),
                source,
            }
        })?;

        let to = recipients("To", &form.to, limits.max_emails_per_field)?;
        let cc = recipients("CC", &form.cc, limits.max_emails_per_field)?;
        let bcc = recipients("BCC", &form.bcc, limits.max_emails_per_field)?;
        if to.is_empty() {
            return Err(MailglossError::MissingField {
                field: "To".to_string(),
            });
        }

        if form.subject.trim().is_empty() {
            return Err(MailglossError::MissingField {
                field: "Subject".to_string(),
            });
        }
        if form.body.trim().is_empty() {
            return Err(MailglossError::MissingField {
                field: "Body".to_string(),
            });
        }
        let length = form.body.chars().count();
        if length > limits.max_body_length {
            return Err(MailglossError::BodyTooLong {
                length,
                max: limits.max_body_length,
            });
        }

        Ok(PreparedEmail {
            provider: provider.clone(),
            email: OutgoingEmail {
                from_address: from.address,
                from_name: from.name,
                to,
                cc,
                bcc,
                subject: form.subject.clone(),
                body: form.body.clone(),
                attachments: form.attachments.clone(),
            },
        })
    }

    /// Substitution values for a template: system defaults of the chosen
    /// provider, then the From field override, then `user_values`.
    pub fn template_values<Tz: TimeZone>(
        &self,
        provider: Option<&str>,
        from_input: &str,
        user_values: BTreeMap<String, String>,
        now: &DateTime<Tz>,
    ) -> Result<BTreeMap<String, String>>
    where
        Tz::Offset: std::fmt::Display,
    {
        let provider = match provider.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Some(self.config.provider(name)?),
            None => self.config.default_provider_config(),
        };
        let domain = provider.and_then(ProviderConfig::domain);
        Ok(VariableValues::new()
            .with_defaults(system_variables(&self.config, provider, now))
            .with_from_override(from_input, domain)
            .with_user_values(user_values)
            .into_map())
    }

    /// Render `template` with `values` into the form's subject and body.
    pub fn apply_template(
        &self,
        form: &mut ComposeForm,
        template: &Template,
        values: &BTreeMap<String, String>,
    ) {
        let rendered = render_template(template, values);
        tracing::debug!(template = %template.name, "template applied to compose form");
        form.subject = rendered.subject;
        form.body = rendered.body;
    }

    /// Validate, build and send `form`, recording the attempt in `history`.
    ///
    /// Validation errors are returned without touching the history. Build and
    /// transport failures are recorded as failed and then returned.
    pub fn send(&self, form: &ComposeForm, history: &mut History) -> Result<SentEmail> {
        let prepared = self.prepare(form)?;
        let outcome = build_message(
            &prepared.email,
            &prepared.provider,
            self.config.limits().max_attachment_size_mb,
        )
        .and_then(|message| self.transport.send(&prepared.provider, &message));

        let entry = SentEmail {
            id: String::new(),
            from: prepared.from_display(),
            to: prepared.email.to.clone(),
            cc: prepared.email.cc.clone(),
            bcc: prepared.email.bcc.clone(),
            subject: prepared.email.subject.clone(),
            body: prepared.email.body.clone(),
            attachments: prepared
                .email
                .attachments
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            sent_at: Utc::now(),
            provider: prepared.provider.kind().to_string(),
            provider_name: prepared.provider.name.clone(),
            status: if outcome.is_ok() {
                SendStatus::Success
            } else {
                SendStatus::Failed
            },
            error: outcome.as_ref().err().map(ToString::to_string),
        };
        let recorded = history.record(entry).clone();

        match outcome {
            Ok(()) => {
                tracing::info!(
                    provider = %recorded.provider_name,
                    recipients = recorded.to.len(),
                    "email sent"
                );
                Ok(recorded)
            }
            Err(e) => {
                tracing::warn!(provider = %recorded.provider_name, error = %e, "email send failed");
                Err(e)
            }
        }
    }
}

fn recipients(field: &str, value: &str, max: usize) -> Result<Vec<String>> {
    let list = split_recipients(value).map_err(|source: ParseError| {
        MailglossError::InvalidAddress {
            field: field.to_string(),
            source,
        }
    })?;
    if list.len() > max {
        return Err(MailglossError::TooManyAddresses {
            field: field.to_string(),
            count: list.len(),
            max,
        });
    }
    Ok(list)
}
