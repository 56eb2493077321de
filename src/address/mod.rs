//! Sender and recipient address resolution.
//!
//! The From field accepts `addr@host`, `Name <addr@host>`, the reversed
//! `<addr@host> Name`, and a bare `user@` that is completed with the active
//! provider's domain. Recipient fields are comma separated lists of mailboxes.

use lettre::address::AddressError;
use lettre::message::Mailbox;

/// An address that does not satisfy the RFC 5322 mailbox grammar.
#[derive(Debug, thiserror::Error)]
#[error("invalid email address '{input}': {reason}")]
pub struct ParseError {
    /// The offending input, after any domain completion.
    pub input: String,
    #[source]
    pub reason: AddressError,
}

/// A resolved sender. Both fields are empty when the From field was left blank.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FromAddress {
    pub address: String,
    pub name: String,
}

impl FromAddress {
    pub fn is_empty(&self) -> bool {
        self.address.is_empty()
    }
}

/// Resolve a From field against an optional provider domain.
///
/// Input ending in `@` is completed with `provider_domain` before parsing. When
/// the standard mailbox grammar rejects the input, a bracketed address with the
/// name on either side is tried; if that also fails, the first error is
/// returned.
pub fn parse_from(input: &str, provider_domain: Option<&str>) -> Result<FromAddress, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(FromAddress::default());
    }

    let input = complete_domain(input, provider_domain);

    let primary_err = match input.parse::<Mailbox>() {
        Ok(mailbox) => return Ok(from_mailbox(mailbox)),
        Err(reason) => reason,
    };

    if let Some(resolved) = parse_bracketed(&input, provider_domain) {
        return Ok(resolved);
    }

    Err(ParseError {
        input,
        reason: primary_err,
    })
}

/// Split a comma separated recipient field and validate every entry.
///
/// Empty entries are skipped. The first invalid entry fails the whole field.
pub fn split_recipients(field: &str) -> Result<Vec<String>, ParseError> {
    field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<Mailbox>() {
            Ok(_) => Ok(s.to_string()),
            Err(reason) => Err(ParseError {
                input: s.to_string(),
                reason,
            }),
        })
        .collect()
}

/// The domain a bare `user@` is completed with, if the input needs one.
fn complete_domain(input: &str, provider_domain: Option<&str>) -> String {
    match provider_domain.filter(|d| !d.is_empty()) {
        Some(domain) if input.ends_with('@') => format!("{input}{domain}"),
        _ => input.to_string(),
    }
}

/// `Name <addr>` or `<addr> Name`, validated with the mailbox grammar.
fn parse_bracketed(input: &str, provider_domain: Option<&str>) -> Option<FromAddress> {
    let open = input.find('<')?;
    let close = open + input[open..].find('>')?;

    let address = complete_domain(input[open + 1..close].trim(), provider_domain);

    let before = input[..open].trim();
    let name = if before.is_empty() {
        input[close + 1..].trim()
    } else {
        before
    };

    address.parse::<Mailbox>().ok()?;
    Some(FromAddress {
        address,
        name: name.to_string(),
    })
}

fn from_mailbox(mailbox: Mailbox) -> FromAddress {
    FromAddress {
        address: mailbox.email.to_string(),
        name: mailbox.name.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(address: &str, name: &str) -> FromAddress {
        FromAddress {
            address: address.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_empty_input_is_blank_sender() {
        assert_eq!(parse_from("", Some("example.com")).unwrap(), FromAddress::default());
        assert_eq!(parse_from("   ", None).unwrap(), FromAddress::default());
        assert!(parse_from("", None).unwrap().is_empty());
    }

    #[test]
    fn test_bare_address() {
        assert_eq!(
            parse_from("jane@example.com", None).unwrap(),
            resolved("jane@example.com", "")
        );
    }

    #[test]
    fn test_local_part_completed_with_domain() {
        assert_eq!(
            parse_from("user@", Some("example.com")).unwrap(),
            resolved("user@example.com", "")
        );
    }

    #[test]
    fn test_local_part_without_domain_fails() {
        let err = parse_from("user@", None).unwrap_err();
        assert_eq!(err.input, "user@");
        let err = parse_from("user@", Some("")).unwrap_err();
        assert_eq!(err.input, "user@");
    }

    #[test]
    fn test_name_before_address() {
        assert_eq!(
            parse_from("Jane Doe <jane@example.com>", None).unwrap(),
            resolved("jane@example.com", "Jane Doe")
        );
    }

    #[test]
    fn test_name_after_address() {
        assert_eq!(
            parse_from("<jane@example.com> Jane Doe", None).unwrap(),
            resolved("jane@example.com", "Jane Doe")
        );
    }

    #[test]
    fn test_bracketed_local_part_completed() {
        assert_eq!(
            parse_from("<jane@> Jane", Some("mg.example.com")).unwrap(),
            resolved("jane@mg.example.com", "Jane")
        );
        assert_eq!(
            parse_from("Jane <jane@>", Some("mg.example.com")).unwrap(),
            resolved("jane@mg.example.com", "Jane")
        );
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        assert_eq!(
            parse_from("  jane@example.com \t", None).unwrap(),
            resolved("jane@example.com", "")
        );
    }

    #[test]
    fn test_invalid_reports_input() {
        let err = parse_from("not-an-email", None).unwrap_err();
        assert_eq!(err.input, "not-an-email");
        assert!(err.to_string().contains("not-an-email"));
    }

    #[test]
    fn test_brackets_out_of_order_fail() {
        assert!(parse_from("> jane@example.com <", None).is_err());
    }

    #[test]
    fn test_fallback_failure_reports_full_input() {
        let err = parse_from("<not valid> Jane", None).unwrap_err();
        assert_eq!(err.input, "<not valid> Jane");
    }

    #[test]
    fn test_split_recipients() {
        assert_eq!(
            split_recipients("a@x.com, Bob <b@y.com>").unwrap(),
            vec!["a@x.com", "Bob <b@y.com>"]
        );
    }

    #[test]
    fn test_split_recipients_empty() {
        assert!(split_recipients("").unwrap().is_empty());
        assert!(split_recipients(" , ,").unwrap().is_empty());
    }

    #[test]
    fn test_split_recipients_rejects_whole_field() {
        let err = split_recipients("a@x.com, not-valid, b@y.com").unwrap_err();
        assert_eq!(err.input, "not-valid");
    }

    #[test]
    fn test_split_recipients_reports_first_offender() {
        let err = split_recipients("bad-one, a@x.com, bad-two").unwrap_err();
        assert_eq!(err.input, "bad-one");
    }
}
