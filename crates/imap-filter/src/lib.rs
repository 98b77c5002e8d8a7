pub mod config;
pub mod email;
pub mod error;
pub mod filter;
pub mod secrets;

pub use config::{load_config, FilterConfig};
pub use email::{Credentials, EmailError, ImapClient, Mailbox, MessageRecord};
pub use error::{ConfigError, FilterError, Result};
pub use filter::{FilterEngine, FilterRule, RunReport};
pub use secrets::{resolve_secret, SecretError};
