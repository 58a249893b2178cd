//! Account lookup and token persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::account::types::{AccountRecord, IssuedToken};

/// Storage collaborator for account lookup and token persistence.
pub trait AccountStore: Send + Sync {
    /// Fetch an account by login name.
    fn get(&self, username: &str) -> Option<AccountRecord>;

    /// Insert or replace a full account record.
    fn put(&self, record: AccountRecord);

    /// Attach freshly issued tokens to an account. Returns false when
    /// the account does not exist.
    fn record_tokens(&self, username: &str, combo: IssuedToken, dispatch: IssuedToken) -> bool;
}

/// Process-local account store.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, AccountRecord>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.read().expect("account store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AccountStore for MemoryAccountStore {
    fn get(&self, username: &str) -> Option<AccountRecord> {
        self.accounts
            .read()
            .expect("account store poisoned")
            .get(username)
            .cloned()
    }

    fn put(&self, record: AccountRecord) {
        self.accounts
            .write()
            .expect("account store poisoned")
            .insert(record.username.clone(), record);
    }

    fn record_tokens(&self, username: &str, combo: IssuedToken, dispatch: IssuedToken) -> bool {
        let mut accounts = self.accounts.write().expect("account store poisoned");
        match accounts.get_mut(username) {
            Some(record) => {
                record.combo_token = Some(combo);
                record.dispatch_token = Some(dispatch);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn token(value: &str) -> IssuedToken {
        IssuedToken::new(value.to_string(), SystemTime::now())
    }

    #[test]
    fn put_then_get_roundtrip() {
        let store = MemoryAccountStore::new();
        store.put(AccountRecord::new("mika".into(), "$argon2id$...".into()));

        let record = store.get("mika").unwrap();
        assert_eq!(record.username, "mika");
        assert!(record.combo_token.is_none());
        assert!(store.get("nobody").is_none());
    }

    #[test]
    fn record_tokens_updates_existing_account() {
        let store = MemoryAccountStore::new();
        store.put(AccountRecord::new("mika".into(), "hash".into()));

        assert!(store.record_tokens("mika", token("combo"), token("dispatch")));
        let record = store.get("mika").unwrap();
        assert_eq!(record.combo_token.unwrap().value, "combo");
        assert_eq!(record.dispatch_token.unwrap().value, "dispatch");
    }

    #[test]
    fn record_tokens_rejects_unknown_account() {
        let store = MemoryAccountStore::new();
        assert!(!store.record_tokens("ghost", token("a"), token("b")));
        assert!(store.is_empty());
    }

    #[test]
    fn put_replaces_previous_record() {
        let store = MemoryAccountStore::new();
        store.put(AccountRecord::new("mika".into(), "old".into()));
        store.put(AccountRecord::new("mika".into(), "new".into()));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("mika").unwrap().password_hash, "new");
    }
}
