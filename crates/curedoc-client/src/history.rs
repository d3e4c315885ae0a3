use curedoc_types::{HistoryEntry, HISTORY_LABEL_MAX_CHARS};

use crate::error::StorageError;
use crate::storage::KeyValueStore;

/// One row of the history sidebar
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarItem {
    /// Position in the history list, for view/delete
    pub index: usize,
    pub label: String,
    pub is_image: bool,
}

/// Ordered conversation history, persisted wholesale on every write
///
/// A write is committed to memory only after the backing store accepted it,
/// so a failed write leaves both sides as they were.
pub struct HistoryStore<S> {
    store: S,
    key: String,
    entries: Vec<HistoryEntry>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Load the list kept under `key`; missing or unreadable data yields an
    /// empty history
    pub fn load(store: S, key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        let entries = match store.get(&key)? {
            Some(raw) => match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Discarding unreadable chat history: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        log::debug!("Loaded {} history entries", entries.len());
        Ok(Self { store, key, entries })
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry and persist the list
    pub fn push(&mut self, entry: HistoryEntry) -> Result<(), StorageError> {
        let mut entries = self.entries.clone();
        entries.push(entry);
        self.commit(entries)
    }

    /// Attach a follow-up resolution to the most recent entry.
    ///
    /// Returns `false` when the history is empty.
    pub fn update_last(&mut self, final_solution: String, session_id: String) -> Result<bool, StorageError> {
        if self.entries.is_empty() {
            return Ok(false);
        }

        let mut entries = self.entries.clone();
        if let Some(last) = entries.last_mut() {
            last.final_solution = Some(final_solution);
            last.session_id = Some(session_id);
        }
        self.commit(entries)?;
        Ok(true)
    }

    /// Delete the entry at `index`; later entries move down by one.
    ///
    /// Out-of-range indices leave the history untouched.
    pub fn remove(&mut self, index: usize) -> Result<Option<HistoryEntry>, StorageError> {
        if index >= self.entries.len() {
            return Ok(None);
        }

        let mut entries = self.entries.clone();
        let removed = entries.remove(index);
        self.commit(entries)?;
        Ok(Some(removed))
    }

    /// Entries newest first, as the sidebar shows them
    pub fn sidebar(&self) -> Vec<SidebarItem> {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .map(|(index, entry)| SidebarItem {
                index,
                label: entry.label(HISTORY_LABEL_MAX_CHARS),
                is_image: entry.kind == curedoc_types::EntryKind::Image,
            })
            .collect()
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn commit(&mut self, entries: Vec<HistoryEntry>) -> Result<(), StorageError> {
        let json = serde_json::to_string(&entries)?;
        self.store.set(&self.key, &json)?;
        log::debug!("Persisted {} history entries", entries.len());
        self.entries = entries;
        Ok(())
    }
}
