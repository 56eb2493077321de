use crate::address::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum MailglossError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("store JSON error in {path}: {source}")]
    StoreJson {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("{field} field: {source}")]
    InvalidAddress { field: String, source: ParseError },

    #[error("{field} field: too many addresses ({count}, max {max})")]
    TooManyAddresses {
        field: String,
        count: usize,
        max: usize,
    },

    #[error("body too long ({length} characters, max {max})")]
    BodyTooLong { length: usize, max: usize },

    #[error("{field} is required")]
    MissingField { field: String },

    #[error("please select a provider")]
    NoProviderSelected,

    #[error("provider '{name}' not found")]
    UnknownProvider { name: String },

    #[error("provider '{name}': {reason}")]
    InvalidProvider { name: String, reason: String },

    #[error("default provider '{name}' does not exist")]
    UnknownDefaultProvider { name: String },

    #[error("invalid date format '{format}'")]
    InvalidDateFormat { format: String },

    #[error("invalid attachment {path}: {reason}")]
    InvalidAttachment {
        path: std::path::PathBuf,
        reason: String,
    },

    #[error("failed to build message: {reason}")]
    MessageBuild { reason: String },

    #[error("failed to send email via '{provider}': {reason}")]
    Transport { provider: String, reason: String },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("no configuration directory available on this platform")]
    NoConfigDir,

    #[error("logging init error: {reason}")]
    LoggingInit { reason: String },
}
