pub mod address;
pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod paths;
pub mod service;
pub mod store;
pub mod template;

pub use error::MailglossError;
pub type Result<T> = std::result::Result<T, MailglossError>;
