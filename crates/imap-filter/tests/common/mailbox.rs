//! In-memory mailbox for driving the filter engine without a server.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;

use imap_filter::email::error::Result;
use imap_filter::{EmailError, Mailbox};

/// A mailbox call, as the engine issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Select { folder: String, readonly: bool },
    Search(Vec<String>),
    FetchRaw(Vec<u32>),
    Move { ids: Vec<u32>, destination: String },
    AddLabel { ids: Vec<u32>, label: String },
    Logout,
}

/// Folders of raw messages keyed by UID.
///
/// Labels only stick to UIDs present in the selected folder, so a label sent
/// after a move of the same batch is a no-op, as it is on a real server.
///
/// Searches ignore the query and return every UID in the selected folder,
/// unless a result was scripted with [`InMemoryMailbox::script_search`].
#[derive(Debug, Default)]
pub struct InMemoryMailbox {
    folders: BTreeMap<String, BTreeMap<u32, Vec<u8>>>,
    labels: HashMap<u32, Vec<String>>,
    scripted_searches: HashMap<(String, Vec<String>), Vec<u32>>,
    failing_moves: HashSet<String>,
    failing_labels: HashSet<String>,
    selected: Option<String>,
    calls: Vec<Call>,
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self::default().with_folder("INBOX")
    }

    /// Adds an empty folder.
    pub fn with_folder(mut self, name: &str) -> Self {
        self.folders.entry(name.to_string()).or_default();
        self
    }

    /// Stores a message in `folder`, creating the folder if needed.
    pub fn with_message(mut self, folder: &str, uid: u32, raw: impl Into<Vec<u8>>) -> Self {
        self.folders
            .entry(folder.to_string())
            .or_default()
            .insert(uid, raw.into());
        self
    }

    /// Makes searches for exactly `query` in `folder` return `ids`.
    pub fn script_search(mut self, folder: &str, query: &[&str], ids: &[u32]) -> Self {
        let query = query.iter().map(|q| q.to_string()).collect();
        self.scripted_searches
            .insert((folder.to_string(), query), ids.to_vec());
        self
    }

    /// Rejects every move into `destination`.
    pub fn fail_moves_to(mut self, destination: &str) -> Self {
        self.failing_moves.insert(destination.to_string());
        self
    }

    /// Rejects every attempt to add `label`.
    pub fn fail_label(mut self, label: &str) -> Self {
        self.failing_labels.insert(label.to_string());
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Calls that would change the mailbox.
    pub fn mutations(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Move { .. } | Call::AddLabel { .. }))
            .collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::FetchRaw(_)))
            .count()
    }

    /// UIDs currently stored in `folder`, ascending.
    pub fn uids_in(&self, folder: &str) -> Vec<u32> {
        self.folders
            .get(folder)
            .map(|messages| messages.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn labels_of(&self, uid: u32) -> &[String] {
        self.labels.get(&uid).map(Vec::as_slice).unwrap_or_default()
    }

    fn selected_folder(&self) -> Result<&str> {
        self.selected.as_deref().ok_or(EmailError::NotConnected)
    }
}

#[async_trait]
impl Mailbox for InMemoryMailbox {
    async fn select_folder(&mut self, folder: &str, readonly: bool) -> Result<()> {
        self.calls.push(Call::Select {
            folder: folder.to_string(),
            readonly,
        });
        if !self.folders.contains_key(folder) {
            self.selected = None;
            return Err(EmailError::FolderNotFound(folder.to_string()));
        }
        self.selected = Some(folder.to_string());
        Ok(())
    }

    async fn search(&mut self, query: &[String]) -> Result<Vec<u32>> {
        self.calls.push(Call::Search(query.to_vec()));
        let folder = self.selected_folder()?.to_string();

        if let Some(ids) = self
            .scripted_searches
            .get(&(folder.clone(), query.to_vec()))
        {
            return Ok(ids.clone());
        }
        Ok(self.uids_in(&folder))
    }

    async fn fetch_raw(&mut self, ids: &[u32]) -> Result<HashMap<u32, Vec<u8>>> {
        self.calls.push(Call::FetchRaw(ids.to_vec()));
        let folder = self.selected_folder()?.to_string();
        let messages = &self.folders[&folder];

        Ok(ids
            .iter()
            .filter_map(|id| messages.get(id).map(|raw| (*id, raw.clone())))
            .collect())
    }

    async fn move_messages(&mut self, ids: &[u32], destination: &str) -> Result<()> {
        self.calls.push(Call::Move {
            ids: ids.to_vec(),
            destination: destination.to_string(),
        });
        if self.failing_moves.contains(destination) {
            return Err(EmailError::ActionFailed {
                action: format!("move to {}", destination),
                count: ids.len(),
                reason: "rejected by test mailbox".to_string(),
            });
        }

        let source = self.selected_folder()?.to_string();
        let mut moved = Vec::with_capacity(ids.len());
        if let Some(messages) = self.folders.get_mut(&source) {
            for id in ids {
                if let Some(raw) = messages.remove(id) {
                    moved.push((*id, raw));
                }
            }
        }
        self.folders
            .entry(destination.to_string())
            .or_default()
            .extend(moved);
        Ok(())
    }

    async fn add_label(&mut self, ids: &[u32], label: &str) -> Result<()> {
        self.calls.push(Call::AddLabel {
            ids: ids.to_vec(),
            label: label.to_string(),
        });
        if self.failing_labels.contains(label) {
            return Err(EmailError::ActionFailed {
                action: format!("label {}", label),
                count: ids.len(),
                reason: "rejected by test mailbox".to_string(),
            });
        }

        // Like STORE on a real server, only UIDs in the selected folder are touched
        let folder = self.selected_folder()?.to_string();
        let present: Vec<u32> = ids
            .iter()
            .copied()
            .filter(|id| self.folders[&folder].contains_key(id))
            .collect();
        for id in present {
            self.labels.entry(id).or_default().push(label.to_string());
        }
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        self.calls.push(Call::Logout);
        self.selected = None;
        Ok(())
    }
}
