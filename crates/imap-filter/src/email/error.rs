//! Mailbox error types.

use thiserror::Error;

/// Errors that can occur while talking to the mailbox.
#[derive(Error, Debug)]
pub enum EmailError {
    /// Failed to connect to the IMAP server.
    #[error("IMAP connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error during connection.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Login rejected by the server.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// IMAP protocol error.
    #[error("IMAP protocol error: {0}")]
    ProtocolError(String),

    /// A fetched message could not be turned into a record.
    #[error("Failed to parse message UID {uid}: {reason}")]
    ParseError { uid: u32, reason: String },

    /// Folder not found.
    #[error("IMAP folder '{0}' not found")]
    FolderNotFound(String),

    /// A batched move or label update was rejected.
    #[error("{action} failed for {count} messages: {reason}")]
    ActionFailed {
        action: String,
        count: usize,
        reason: String,
    },

    /// Operation requires an open session.
    #[error("Not connected")]
    NotConnected,
}

impl From<async_native_tls::Error> for EmailError {
    fn from(err: async_native_tls::Error) -> Self {
        EmailError::TlsError(err.to_string())
    }
}

/// Result type for mailbox operations.
pub type Result<T> = std::result::Result<T, EmailError>;
