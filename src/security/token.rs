//! Session token lifetimes and minting.
//!
//! Tokens are opaque random strings; possession plus freshness is the
//! whole credential. The policy only does arithmetic on issue time and
//! class TTL, so callers decide which clock to ask.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

use crate::config::duration::{parse_duration, DurationParseError};
use crate::config::schema::DispatchConfig;

/// Length of a minted token in characters.
pub const TOKEN_LENGTH: usize = 32;

/// The two token classes issued at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Session token consumed by follow-up token logins.
    Combo,
    /// Token handed to the region a client is dispatched to.
    Dispatch,
}

/// Per-class token lifetime policy.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    combo_ttl: Duration,
    dispatch_ttl: Duration,
}

impl TokenPolicy {
    pub fn new(combo_ttl: Duration, dispatch_ttl: Duration) -> Self {
        Self {
            combo_ttl,
            dispatch_ttl,
        }
    }

    /// Parse the configured TTL literals into a policy.
    pub fn from_config(config: &DispatchConfig) -> Result<Self, DurationParseError> {
        Ok(Self::new(
            parse_duration(&config.combo_token_ttl)?,
            parse_duration(&config.dispatch_token_ttl)?,
        ))
    }

    pub fn ttl(&self, class: TokenClass) -> Duration {
        match class {
            TokenClass::Combo => self.combo_ttl,
            TokenClass::Dispatch => self.dispatch_ttl,
        }
    }

    /// Expiry instant for a token of `class` issued at `issued_at`.
    pub fn expiry_of(&self, class: TokenClass, issued_at: SystemTime) -> SystemTime {
        issued_at + self.ttl(class)
    }

    /// A token is valid strictly before its expiry instant and invalid
    /// from that instant on.
    pub fn is_valid(&self, class: TokenClass, issued_at: SystemTime, now: SystemTime) -> bool {
        now < self.expiry_of(class, issued_at)
    }

    /// Mint a fresh opaque token from the OS RNG.
    pub fn mint() -> String {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }
}

/// Compare two token strings without short-circuiting on the first
/// mismatching byte.
pub fn constant_time_eq(lhs: &str, rhs: &str) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }
    lhs.bytes()
        .zip(rhs.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Seconds since the Unix epoch, saturating at zero for pre-epoch
/// instants.
pub fn unix_seconds(instant: SystemTime) -> u64 {
    instant
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_ttl_literals_are_parsed() {
        let policy = TokenPolicy::from_config(&DispatchConfig::default()).unwrap();
        assert_eq!(policy.ttl(TokenClass::Combo), Duration::from_secs(259_200));
        assert_eq!(
            policy.ttl(TokenClass::Dispatch),
            Duration::from_secs(259_200)
        );
    }

    #[test]
    fn classes_have_independent_ttls() {
        let policy = TokenPolicy::new(Duration::from_secs(100), Duration::from_secs(7));
        let issued = SystemTime::now();

        assert_eq!(
            policy.expiry_of(TokenClass::Combo, issued),
            issued + Duration::from_secs(100)
        );
        assert_eq!(
            policy.expiry_of(TokenClass::Dispatch, issued),
            issued + Duration::from_secs(7)
        );
    }

    #[test]
    fn validity_flips_exactly_at_expiry() {
        let policy = TokenPolicy::new(Duration::from_secs(60), Duration::from_secs(60));
        let issued = SystemTime::now();
        let expiry = policy.expiry_of(TokenClass::Combo, issued);

        assert!(policy.is_valid(TokenClass::Combo, issued, issued));
        assert!(policy.is_valid(
            TokenClass::Combo,
            issued,
            expiry - Duration::from_nanos(1)
        ));
        assert!(!policy.is_valid(TokenClass::Combo, issued, expiry));
        assert!(!policy.is_valid(
            TokenClass::Combo,
            issued,
            expiry + Duration::from_secs(1)
        ));
    }

    #[test]
    fn minted_tokens_are_distinct_alphanumeric() {
        let first = TokenPolicy::mint();
        let second = TokenPolicy::mint();

        assert_eq!(first.len(), TOKEN_LENGTH);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[test]
    fn constant_time_eq_matches_equality() {
        assert!(constant_time_eq("abc123", "abc123"));
        assert!(!constant_time_eq("abc123", "abc124"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("", ""));
    }
}
