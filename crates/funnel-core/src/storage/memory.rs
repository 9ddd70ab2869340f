//! In-memory document store.

use super::StateStore;
use crate::formats::persistence::{decode_state, encode_state};
use crate::store::CrmState;
use crate::types::FunnelError;
use std::collections::BTreeMap;

/// Holds encoded documents by key.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: BTreeMap<String, String>,
    saves: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw document under `key`.
    #[must_use]
    pub fn document(&self, key: &str) -> Option<&str> {
        self.documents.get(key).map(String::as_str)
    }

    /// Store a raw document, bypassing encoding.
    pub fn put_document(&mut self, key: impl Into<String>, document: impl Into<String>) {
        self.documents.insert(key.into(), document.into());
    }

    /// Number of completed full saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<CrmState, FunnelError> {
        decode_state(|key| Ok(self.documents.get(key).cloned()))
    }

    fn save(&mut self, state: &CrmState) -> Result<(), FunnelError> {
        for (key, document) in encode_state(state)? {
            self.documents.insert(key.to_string(), document);
        }
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::persistence::{ALL_KEYS, KEY_USER_ROLE};
    use crate::types::Role;

    #[test]
    fn save_writes_every_key() {
        let mut store = MemoryStore::new();
        store.save(&CrmState::with_default_directory()).expect("save");
        for key in ALL_KEYS {
            assert!(store.document(key).is_some(), "{key}");
        }
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn corrupt_document_fails_load() {
        let mut store = MemoryStore::new();
        store.put_document(KEY_USER_ROLE, "{\"format\":\"funnel\",\"version\":1,\"data\":\"Intern\"}");
        assert!(matches!(store.load(), Err(FunnelError::StorageError(_))));
    }

    #[test]
    fn role_survives_save() {
        let mut store = MemoryStore::new();
        let mut state = store.load().expect("load");
        state.role = Role::DeliveryManager;
        store.save(&state).expect("save");
        assert_eq!(store.load().expect("load").role, Role::DeliveryManager);
    }
}
