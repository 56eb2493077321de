use serde::{Deserialize, Serialize};

use crate::{MailglossError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailgunConfig {
    pub api_key: String,
    /// Sending domain; also completes a bare `user@` From field.
    pub domain: String,
    /// API base, e.g. `https://api.mailgun.net` or `https://api.eu.mailgun.net`.
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendGridConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostmarkConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparkPostConfig {
    pub api_key: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalConfig {
    pub url: String,
    pub api_key: String,
}

/// Transport-specific settings, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderTransport {
    Smtp(SmtpConfig),
    Mailgun(MailgunConfig),
    SendGrid(SendGridConfig),
    Postmark(PostmarkConfig),
    SparkPost(SparkPostConfig),
    Postal(PostalConfig),
}

impl ProviderTransport {
    /// The `type` tag, as written in configuration.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Mailgun(_) => "mailgun",
            Self::SendGrid(_) => "sendgrid",
            Self::Postmark(_) => "postmark",
            Self::SparkPost(_) => "sparkpost",
            Self::Postal(_) => "postal",
        }
    }
}

/// A named outbound provider with its default sender identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub from_address: String,
    #[serde(default)]
    pub from_name: String,
    pub transport: ProviderTransport,
}

impl ProviderConfig {
    /// The domain used to complete a bare `user@` From field. Only Mailgun
    /// providers carry one.
    pub fn domain(&self) -> Option<&str> {
        match &self.transport {
            ProviderTransport::Mailgun(cfg) if !cfg.domain.is_empty() => Some(&cfg.domain),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.transport.kind()
    }

    pub fn validate(&self) -> Result<()> {
        let require = |ok: bool, field: &str| {
            if ok {
                Ok(())
            } else {
                Err(MailglossError::InvalidProvider {
                    name: self.name.clone(),
                    reason: format!("{field} is required"),
                })
            }
        };

        require(!self.name.is_empty(), "name")?;
        require(!self.from_address.is_empty(), "from_address")?;

        match &self.transport {
            ProviderTransport::Smtp(cfg) => {
                require(!cfg.host.is_empty(), "smtp.host")?;
                require(cfg.port != 0, "smtp.port")
            }
            ProviderTransport::Mailgun(cfg) => {
                require(!cfg.api_key.is_empty(), "mailgun.api_key")?;
                require(!cfg.domain.is_empty(), "mailgun.domain")
            }
            ProviderTransport::SendGrid(cfg) => require(!cfg.api_key.is_empty(), "sendgrid.api_key"),
            ProviderTransport::Postmark(cfg) => require(!cfg.api_key.is_empty(), "postmark.api_key"),
            ProviderTransport::SparkPost(cfg) => {
                require(!cfg.api_key.is_empty(), "sparkpost.api_key")
            }
            ProviderTransport::Postal(cfg) => {
                require(!cfg.url.is_empty(), "postal.url")?;
                require(!cfg.api_key.is_empty(), "postal.api_key")
            }
        }
    }
}
