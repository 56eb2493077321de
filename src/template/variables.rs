use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone};

use super::types::Template;
use crate::address::parse_from;
use crate::config::{Config, ProviderConfig};

pub const DATE: &str = "date";
pub const FROM_NAME: &str = "from_name";
pub const FROM_EMAIL: &str = "from_email";

/// Variables the client can always fill in, in prompt order.
pub const SYSTEM_VARIABLES: [&str; 3] = [DATE, FROM_NAME, FROM_EMAIL];

/// Names the user is asked for: the template's own variables followed by any
/// system variable the template does not already use.
pub fn prompt_variables(template: &Template) -> Vec<String> {
    let mut names = template.variables.clone();
    for sys in SYSTEM_VARIABLES {
        if !names.iter().any(|n| n == sys) {
            names.push(sys.to_string());
        }
    }
    names
}

/// System defaults: today's date and the provider's sender identity.
pub fn system_variables<Tz: TimeZone>(
    config: &Config,
    provider: Option<&ProviderConfig>,
    now: &DateTime<Tz>,
) -> BTreeMap<String, String>
where
    Tz::Offset: std::fmt::Display,
{
    let mut values = BTreeMap::new();
    values.insert(DATE.to_string(), config.format_date(now));
    if let Some(provider) = provider {
        if !provider.from_name.is_empty() {
            values.insert(FROM_NAME.to_string(), provider.from_name.clone());
        }
        if !provider.from_address.is_empty() {
            values.insert(FROM_EMAIL.to_string(), provider.from_address.clone());
        }
    }
    values
}

/// Substitution values merged by priority: defaults, then the From field
/// override, then explicit user input. Later layers win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableValues {
    values: BTreeMap<String, String>,
}

impl VariableValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, defaults: BTreeMap<String, String>) -> Self {
        self.values.extend(defaults);
        self
    }

    /// Take `from_name`/`from_email` from a From field the user typed. Input that
    /// does not resolve to an address is ignored.
    pub fn with_from_override(mut self, from_input: &str, provider_domain: Option<&str>) -> Self {
        match parse_from(from_input, provider_domain) {
            Ok(from) => {
                if !from.name.is_empty() {
                    self.values.insert(FROM_NAME.to_string(), from.name);
                }
                if !from.address.is_empty() {
                    self.values.insert(FROM_EMAIL.to_string(), from.address);
                }
            }
            Err(e) => tracing::debug!(error = %e, "From override ignored for template defaults"),
        }
        self
    }

    /// Explicit values always win, including empty ones.
    pub fn with_user_values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.values.extend(values);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.values
    }
}
