//! The mailbox operations the filter engine depends on.

use std::collections::HashMap;

use async_trait::async_trait;

use super::error::Result;

/// Gmail system label applied by the `star` action.
pub const STARRED_LABEL: &str = "\\Starred";

/// Gmail system label applied by the `mark` action.
pub const IMPORTANT_LABEL: &str = "\\Important";

/// A selected-folder mailbox session.
///
/// Every call is a blocking round-trip from the engine's point of view: the
/// engine awaits each one before issuing the next.
#[async_trait]
pub trait Mailbox: Send {
    /// Selects `folder`; subsequent searches, fetches and actions apply to it.
    async fn select_folder(&mut self, folder: &str, readonly: bool) -> Result<()>;

    /// Runs a UID search in the selected folder. Criteria are joined with spaces.
    async fn search(&mut self, query: &[String]) -> Result<Vec<u32>>;

    /// Fetches the raw header block of each message.
    ///
    /// Ids the server returns nothing for are simply absent from the map.
    async fn fetch_raw(&mut self, ids: &[u32]) -> Result<HashMap<u32, Vec<u8>>>;

    /// Moves messages out of the selected folder in a single batch.
    async fn move_messages(&mut self, ids: &[u32], destination: &str) -> Result<()>;

    /// Adds `label` to every message in a single batch.
    async fn add_label(&mut self, ids: &[u32], label: &str) -> Result<()>;

    /// Ends the session.
    async fn logout(&mut self) -> Result<()>;
}
