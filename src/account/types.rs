//! Account and token record types.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// A token issued at login, paired with its issue instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Opaque token value.
    pub value: String,

    /// Instant the token was minted.
    pub issued_at: SystemTime,
}

impl IssuedToken {
    pub fn new(value: String, issued_at: SystemTime) -> Self {
        Self { value, issued_at }
    }
}

/// One account as the gateway sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Login name, unique within the store.
    pub username: String,

    /// Self-describing PHC password hash record.
    pub password_hash: String,

    /// Last issued combo token, if any.
    pub combo_token: Option<IssuedToken>,

    /// Last issued dispatch token, if any.
    pub dispatch_token: Option<IssuedToken>,
}

impl AccountRecord {
    /// Create a record with no issued tokens yet.
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            username,
            password_hash,
            combo_token: None,
            dispatch_token: None,
        }
    }
}
