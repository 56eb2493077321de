//! Turns a composed email into a `lettre` [`Message`] ready for a transport.

use std::path::{Component, Path, PathBuf};

use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::{Address, Message};

use crate::config::ProviderConfig;
use crate::{MailglossError, Result};

/// A validated email waiting to be handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingEmail {
    /// Overrides the provider's from address when non-empty.
    pub from_address: String,
    /// Overrides the provider's from name when non-empty.
    pub from_name: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

impl OutgoingEmail {
    /// Effective sender: the override if set, the provider's identity otherwise.
    pub fn sender(&self, provider: &ProviderConfig) -> (String, String) {
        if self.from_address.is_empty() {
            (provider.from_address.clone(), provider.from_name.clone())
        } else if self.from_name.is_empty() {
            (self.from_address.clone(), provider.from_name.clone())
        } else {
            (self.from_address.clone(), self.from_name.clone())
        }
    }
}

/// Build a [`Message`] from `email` using `provider` for sender defaults.
///
/// The body is sent as `multipart/alternative` with the plain text and an HTML
/// rendition of it. Attachments, checked against `max_attachment_mb`, are
/// wrapped in an outer `multipart/mixed`.
pub fn build_message(
    email: &OutgoingEmail,
    provider: &ProviderConfig,
    max_attachment_mb: u64,
) -> Result<Message> {
    if email.to.is_empty() {
        return Err(MailglossError::MissingField {
            field: "at least one recipient".to_string(),
        });
    }
    if email.subject.is_empty() {
        return Err(MailglossError::MissingField {
            field: "subject".to_string(),
        });
    }
    if email.body.is_empty() {
        return Err(MailglossError::MissingField {
            field: "body".to_string(),
        });
    }

    let (from_address, from_name) = email.sender(provider);
    let address = from_address
        .parse::<Address>()
        .map_err(|e| MailglossError::MessageBuild {
            reason: format!("invalid from address '{from_address}': {e}"),
        })?;
    let from = Mailbox::new(Some(from_name).filter(|n| !n.is_empty()), address);

    let mut builder = Message::builder().from(from).subject(&email.subject);
    for to in &email.to {
        builder = builder.to(parse_mailbox("to", to)?);
    }
    for cc in &email.cc {
        builder = builder.cc(parse_mailbox("cc", cc)?);
    }
    for bcc in &email.bcc {
        builder = builder.bcc(parse_mailbox("bcc", bcc)?);
    }

    let alternative = MultiPart::alternative()
        .singlepart(SinglePart::plain(email.body.clone()))
        .singlepart(SinglePart::html(plain_text_to_html(&email.body)));

    let message = if email.attachments.is_empty() {
        builder.multipart(alternative)
    } else {
        let mut mixed = MultiPart::mixed().multipart(alternative);
        for path in &email.attachments {
            mixed = mixed.singlepart(read_attachment(path, max_attachment_mb)?);
        }
        builder.multipart(mixed)
    };

    message.map_err(|e| MailglossError::MessageBuild {
        reason: e.to_string(),
    })
}

/// Escape `text` and wrap it in a minimal HTML document, one `<br>` per newline.
pub fn plain_text_to_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 32);
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            '\n' => escaped.push_str("<br>\n"),
            _ => escaped.push(ch),
        }
    }
    format!("<html><body><p>{escaped}</p></body></html>")
}

/// Check that `path` is a readable regular file within the size limit and does
/// not traverse upwards.
pub fn validate_attachment(path: &Path, max_mb: u64) -> Result<()> {
    let invalid = |reason: String| MailglossError::InvalidAttachment {
        path: path.to_path_buf(),
        reason,
    };

    if path.components().any(|c| c == Component::ParentDir) {
        return Err(invalid("directory traversal not allowed".to_string()));
    }

    let meta = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            invalid("file does not exist".to_string())
        } else {
            invalid(format!("cannot access file: {e}"))
        }
    })?;
    if !meta.is_file() {
        return Err(invalid("not a regular file".to_string()));
    }

    let max_bytes = max_mb.saturating_mul(1024 * 1024);
    if meta.len() > max_bytes {
        return Err(invalid(format!(
            "file too large (max {max_mb}MB, got {} bytes)",
            meta.len()
        )));
    }

    Ok(())
}

fn read_attachment(path: &Path, max_mb: u64) -> Result<SinglePart> {
    validate_attachment(path, max_mb)?;
    let bytes = std::fs::read(path).map_err(|e| MailglossError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let name = attachment_name(path);
    let content_type = content_type_for(path);
    tracing::debug!(filename = %name, size = bytes.len(), "attachment added");
    Ok(Attachment::new(name).body(bytes, content_type))
}

/// Guess the MIME type from the extension, defaulting to `application/octet-stream`.
fn content_type_for(path: &Path) -> ContentType {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    ContentType::parse(mime.as_ref())
        .or_else(|_| ContentType::parse("application/octet-stream"))
        .unwrap_or(ContentType::TEXT_PLAIN)
}

fn attachment_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string()
}

fn parse_mailbox(field: &str, value: &str) -> Result<Mailbox> {
    value
        .parse::<Mailbox>()
        .map_err(|e| MailglossError::MessageBuild {
            reason: format!("invalid {field} address '{value}': {e}"),
        })
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::config::{ProviderTransport, SendGridConfig};

    fn provider() -> ProviderConfig {
        ProviderConfig {
            name: "sg".to_string(),
            from_address: "default@example.com".to_string(),
            from_name: "Default Sender".to_string(),
            transport: ProviderTransport::SendGrid(SendGridConfig {
                api_key: "k".to_string(),
            }),
        }
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            to: vec!["Recipient <recipient@example.com>".to_string()],
            subject: "Test Subject".to_string(),
            body: "Hello\n<world> & co".to_string(),
            ..OutgoingEmail::default()
        }
    }

    fn raw(message: &Message) -> String {
        String::from_utf8(message.formatted()).unwrap()
    }

    #[test]
    fn test_provider_sender_used_by_default() {
        let msg = build_message(&email(), &provider(), 25).unwrap();
        let raw = raw(&msg);
        assert!(raw.contains("default@example.com"), "missing From: {raw}");
        assert!(raw.contains("Default Sender"), "missing From name: {raw}");
        assert!(raw.contains("recipient@example.com"), "missing To");
        assert!(raw.contains("Subject: Test Subject"), "missing Subject");
    }

    #[test]
    fn test_sender_override() {
        let e = OutgoingEmail {
            from_address: "me@example.com".to_string(),
            from_name: "Me".to_string(),
            ..email()
        };
        assert_eq!(
            e.sender(&provider()),
            ("me@example.com".to_string(), "Me".to_string())
        );
        let raw = raw(&build_message(&e, &provider(), 25).unwrap());
        assert!(raw.contains("me@example.com"));
        assert!(!raw.contains("default@example.com"));
    }

    #[test]
    fn test_override_address_keeps_provider_name() {
        let e = OutgoingEmail {
            from_address: "me@example.com".to_string(),
            ..email()
        };
        assert_eq!(
            e.sender(&provider()),
            ("me@example.com".to_string(), "Default Sender".to_string())
        );
    }

    #[test]
    fn test_multipart_alternative() {
        let raw = raw(&build_message(&email(), &provider(), 25).unwrap());
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn test_required_parts() {
        let no_to = OutgoingEmail {
            to: vec![],
            ..email()
        };
        assert!(matches!(
            build_message(&no_to, &provider(), 25),
            Err(MailglossError::MissingField { .. })
        ));
        let no_subject = OutgoingEmail {
            subject: String::new(),
            ..email()
        };
        assert!(build_message(&no_subject, &provider(), 25).is_err());
        let no_body = OutgoingEmail {
            body: String::new(),
            ..email()
        };
        assert!(build_message(&no_body, &provider(), 25).is_err());
    }

    #[test]
    fn test_plain_text_to_html() {
        assert_eq!(
            plain_text_to_html("a < b\nc & \"d\""),
            "<html><body><p>a &lt; b<br>\nc &amp; &#34;d&#34;</p></body></html>"
        );
    }

    #[test]
    fn test_attachment_included() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "attached content").unwrap();
        let e = OutgoingEmail {
            attachments: vec![file.path().to_path_buf()],
            ..email()
        };
        let raw = raw(&build_message(&e, &provider(), 25).unwrap());
        assert!(raw.contains("multipart/mixed"));
        let name = file.path().file_name().unwrap().to_str().unwrap();
        assert!(raw.contains(name), "missing attachment name in: {raw}");
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(
            content_type_for(Path::new("report.pdf")),
            ContentType::parse("application/pdf").unwrap()
        );
        assert_eq!(
            content_type_for(Path::new("blob.unknownext")),
            ContentType::parse("application/octet-stream").unwrap()
        );
    }

    #[test]
    fn test_validate_attachment_missing() {
        let err = validate_attachment(Path::new("/nonexistent/report.pdf"), 25).unwrap_err();
        assert!(err.to_string().contains("does not exist"), "got: {err}");
    }

    #[test]
    fn test_validate_attachment_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_attachment(dir.path(), 25).unwrap_err();
        assert!(err.to_string().contains("not a regular file"), "got: {err}");
    }

    #[test]
    fn test_validate_attachment_traversal() {
        let err = validate_attachment(Path::new("../secret.txt"), 25).unwrap_err();
        assert!(err.to_string().contains("traversal"), "got: {err}");
    }

    #[test]
    fn test_validate_attachment_too_large() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; 1024 * 1024 + 1]).unwrap();
        let err = validate_attachment(file.path(), 1).unwrap_err();
        assert!(err.to_string().contains("too large"), "got: {err}");
        assert!(validate_attachment(file.path(), 2).is_ok());
    }
}
