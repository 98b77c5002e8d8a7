//! Mailbox access.
//!
//! This module holds the [`Mailbox`] boundary the filter engine talks to, its
//! IMAP implementation, and the parser that turns fetched headers into
//! [`MessageRecord`]s.

pub mod client;
pub mod error;
pub mod mailbox;
pub mod parser;

pub use client::{Credentials, ImapClient};
pub use error::EmailError;
pub use mailbox::Mailbox;
pub use parser::MessageRecord;
