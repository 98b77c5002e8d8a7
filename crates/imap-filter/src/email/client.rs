//! IMAP client for connecting to email servers.

use std::collections::HashMap;

use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use super::error::{EmailError, Result};
use super::mailbox::Mailbox;

/// Default port for IMAP over TLS.
pub const DEFAULT_IMAP_PORT: u16 = 993;

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<std::net::TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// Everything needed to open an authenticated session.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// IMAP server hostname (e.g., "imap.gmail.com").
    pub domain: String,
    /// IMAP server port.
    pub port: u16,
    /// Login name, typically the email address.
    pub username: String,
    /// Login password.
    pub password: SecretString,
}

impl Credentials {
    /// Credentials for the default IMAPS port.
    pub fn new(domain: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            domain: domain.into(),
            port: DEFAULT_IMAP_PORT,
            username: username.into(),
            password,
        }
    }
}

/// IMAP client that owns a single session for the duration of a run.
pub struct ImapClient {
    session: Option<Session<TlsStream>>,
    credentials: Credentials,
    current_folder: Option<String>,
}

impl ImapClient {
    /// Creates a new, unconnected IMAP client.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            session: None,
            credentials,
            current_folder: None,
        }
    }

    /// Connects to the IMAP server and authenticates.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }

        let addr = format!("{}:{}", self.credentials.domain, self.credentials.port);
        info!("Connecting to IMAP server at {}", addr);

        // Establish TCP connection using std::net and wrap with async-io
        let std_stream = std::net::TcpStream::connect(&addr)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        let tcp_stream = async_io::Async::new(std_stream)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;

        let tls = TlsConnector::new();
        let tls_stream = tls.connect(&self.credentials.domain, tcp_stream).await?;

        let client = async_imap::Client::new(tls_stream);
        let session = client
            .login(
                &self.credentials.username,
                self.credentials.password.expose_secret(),
            )
            .await
            .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))?;

        info!(
            "Authenticated to {} as {}",
            self.credentials.domain, self.credentials.username
        );
        self.session = Some(session);
        Ok(())
    }

    /// Returns the folder selected last, if any.
    pub fn current_folder(&self) -> Option<&str> {
        self.current_folder.as_deref()
    }

    /// Checks if the client is currently connected.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn session(&mut self) -> Result<&mut Session<TlsStream>> {
        self.session.as_mut().ok_or(EmailError::NotConnected)
    }
}

/// Builds an IMAP sequence set (e.g., "1,2,5,10").
fn uid_set(ids: &[u32]) -> String {
    ids.iter()
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl Mailbox for ImapClient {
    async fn select_folder(&mut self, folder: &str, readonly: bool) -> Result<()> {
        let session = self.session()?;

        // EXAMINE leaves \Seen and friends untouched
        let selected = if readonly {
            debug!("Examining folder: {}", folder);
            session.examine(folder).await
        } else {
            debug!("Selecting folder: {}", folder);
            session.select(folder).await
        };

        selected.map_err(|e| {
            if e.to_string().contains("Mailbox doesn't exist") || e.to_string().contains("NO") {
                EmailError::FolderNotFound(folder.to_string())
            } else {
                EmailError::ProtocolError(e.to_string())
            }
        })?;

        self.current_folder = Some(folder.to_string());
        Ok(())
    }

    async fn search(&mut self, query: &[String]) -> Result<Vec<u32>> {
        let session = self.session()?;
        let query = query.join(" ");
        debug!("Searching with query: {}", query);

        let uids = session
            .uid_search(&query)
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        // UID SEARCH hands back a set; keep mailbox order for stable logs
        let mut uid_list: Vec<u32> = uids.into_iter().collect();
        uid_list.sort_unstable();
        debug!("Found {} messages matching search", uid_list.len());
        Ok(uid_list)
    }

    async fn fetch_raw(&mut self, ids: &[u32]) -> Result<HashMap<u32, Vec<u8>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let uids = uid_set(ids);
        let session = self.session()?;
        debug!("Fetching headers for {} messages", ids.len());

        // BODY.PEEK[HEADER] fetches headers only and does not set \Seen
        let mut messages = session
            .uid_fetch(&uids, "(UID BODY.PEEK[HEADER])")
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        let mut results = HashMap::with_capacity(ids.len());
        while let Some(message_result) = messages.next().await {
            match message_result {
                Ok(message) => {
                    if let (Some(uid), Some(header)) = (message.uid, message.header()) {
                        results.insert(uid, header.to_vec());
                    } else {
                        warn!("Message missing UID or header");
                    }
                }
                Err(e) => {
                    warn!("Error fetching message: {}", e);
                }
            }
        }

        debug!("Successfully fetched {} of {} messages", results.len(), ids.len());
        Ok(results)
    }

    async fn move_messages(&mut self, ids: &[u32], destination: &str) -> Result<()> {
        let uids = uid_set(ids);
        let session = self.session()?;
        debug!("UID MOVE {} -> {}", uids, destination);

        session
            .uid_mv(&uids, destination)
            .await
            .map_err(|e| EmailError::ActionFailed {
                action: format!("move to '{}'", destination),
                count: ids.len(),
                reason: e.to_string(),
            })
    }

    async fn add_label(&mut self, ids: &[u32], label: &str) -> Result<()> {
        let uids = uid_set(ids);
        let session = self.session()?;
        let query = format!("+X-GM-LABELS ({})", label);
        debug!("UID STORE {} {}", uids, query);

        let action_failed = |reason: String| EmailError::ActionFailed {
            action: format!("label {}", label),
            count: ids.len(),
            reason,
        };

        let mut updates = session
            .uid_store(&uids, &query)
            .await
            .map_err(|e| action_failed(e.to_string()))?;

        // Drain the untagged FETCH responses so the session is ready for the next command
        while let Some(update) = updates.next().await {
            update.map_err(|e| action_failed(e.to_string()))?;
        }
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!("Logging out from IMAP server");
            session
                .logout()
                .await
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
        }
        self.current_folder = None;
        Ok(())
    }
}

impl Drop for ImapClient {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapClient dropped without explicit logout - session will be closed");
        }
    }
}
