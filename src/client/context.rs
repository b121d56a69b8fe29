use super::store::KeyValueStore;
use crate::{
    error::{Result, StylegenError},
    models::HistoryEntry,
};
use std::sync::Arc;

pub const CREDENTIAL_KEY: &str = "openai-api-key";
pub const HISTORY_KEY: &str = "image-history";

/// Client state that outlives a session: the user's API key and the history
/// of completed batches. Loaded once, written back on every change.
pub struct ClientContext {
    store: Arc<dyn KeyValueStore>,
    credential: Option<String>,
    history: Vec<HistoryEntry>,
}

impl ClientContext {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let credential = store.get(CREDENTIAL_KEY)?.filter(|k| !k.trim().is_empty());

        let history = match store.get(HISTORY_KEY)? {
            None => Vec::new(),
            Some(raw) => match parse_history(&raw) {
                Ok(history) => history,
                Err(e) => {
                    log::warn!("Discarding unreadable history: {}", e);
                    if let Err(e) = store.remove(HISTORY_KEY) {
                        log::warn!("Could not remove unreadable history: {}", e);
                    }
                    Vec::new()
                }
            },
        };

        log::debug!("Loaded {} history entries", history.len());

        Ok(Self {
            store,
            credential,
            history,
        })
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Stores a new key; `None` or a blank key forgets the current one.
    pub fn set_credential(&mut self, credential: Option<String>) -> Result<()> {
        let credential = credential.filter(|k| !k.trim().is_empty());
        match &credential {
            Some(key) => self.store.set(CREDENTIAL_KEY, key)?,
            None => self.store.remove(CREDENTIAL_KEY)?,
        }
        self.credential = credential;
        Ok(())
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn find_history(&self, id: &str) -> Option<&HistoryEntry> {
        self.history.iter().find(|e| e.id == id)
    }

    pub fn add_history(&mut self, entry: HistoryEntry) -> Result<()> {
        self.history.push(entry);
        self.save_history()
    }

    pub fn remove_history(&mut self, id: &str) -> Result<bool> {
        let before = self.history.len();
        self.history.retain(|e| e.id != id);
        if self.history.len() == before {
            return Ok(false);
        }
        self.save_history()?;
        Ok(true)
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear();
        self.store.remove(HISTORY_KEY)
    }

    fn save_history(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.history)?;
        self.store.set(HISTORY_KEY, &raw)
    }
}

fn parse_history(raw: &str) -> Result<Vec<HistoryEntry>> {
    serde_json::from_str(raw).map_err(|e| StylegenError::StorageParse(e.to_string()))
}
