//! Peppered Argon2id credential hashing.
//!
//! # Responsibilities
//! - Derive self-describing PHC hash records from plaintext passwords
//! - Verify presented passwords against stored records
//! - Bound concurrent hashing work and keep it off async workers
//!
//! # Design Decisions
//! - Every hash gets a fresh random salt; records embed algorithm,
//!   version, cost parameters and salt, so stored records survive
//!   config cost changes
//! - The pepper is an instance-wide secret that never appears in
//!   records; losing it invalidates every stored record
//! - Verification fails closed: malformed records and internal errors
//!   all report a mismatch

use std::sync::Arc;

use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::schema::PasswordSettings;

/// Minimum decoded pepper length in bytes.
pub const MIN_PEPPER_LENGTH: usize = 16;

/// Supported salt length range in bytes. The upper bound is what the
/// PHC record salt field can carry (64 base64 characters).
pub const MIN_SALT_LENGTH: usize = 16;
pub const MAX_SALT_LENGTH: usize = 48;

/// Supported digest length range in bytes.
pub const MIN_OUTPUT_LENGTH: usize = 16;
pub const MAX_OUTPUT_LENGTH: usize = 64;

/// Error type for credential hashing.
#[derive(Debug, Error)]
pub enum HashPolicyError {
    #[error("pepper is missing or malformed (need base64 of at least {MIN_PEPPER_LENGTH} bytes)")]
    Pepper,

    #[error("unsupported argon2 version tag {0}")]
    Version(u32),

    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),

    #[error("failed to derive password hash: {0}")]
    Derive(argon2::password_hash::Error),

    #[error("hash worker task aborted")]
    Worker,
}

/// Credential hashing policy for one gateway instance.
pub struct PasswordPolicy {
    pepper: Vec<u8>,
    params: Params,
    version: Version,
    salt_length: usize,
    permits: Arc<Semaphore>,
    decoy_record: String,
}

impl PasswordPolicy {
    /// Build a policy from validated settings.
    pub fn from_settings(settings: &PasswordSettings) -> Result<Self, HashPolicyError> {
        let pepper = settings
            .decode_pepper()
            .map_err(|_| HashPolicyError::Pepper)?;
        if pepper.len() < MIN_PEPPER_LENGTH {
            return Err(HashPolicyError::Pepper);
        }

        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            Some(settings.output_length),
        )
        .map_err(HashPolicyError::Params)?;

        let version = match settings.version {
            16 => Version::V0x10,
            19 => Version::V0x13,
            other => return Err(HashPolicyError::Version(other)),
        };

        let mut policy = Self {
            pepper,
            params,
            version,
            salt_length: settings.salt_length,
            permits: Arc::new(Semaphore::new(settings.max_concurrent)),
            decoy_record: String::new(),
        };

        // A record of a throwaway random password; lookups that find no
        // account verify against it so their timing matches a mismatch.
        let mut throwaway = [0u8; 32];
        OsRng.fill_bytes(&mut throwaway);
        policy.decoy_record = policy.hash(&STANDARD.encode(throwaway))?;

        Ok(policy)
    }

    /// Hash record no presented password matches, for padding lookups
    /// of unknown accounts.
    pub fn decoy_record(&self) -> &str {
        &self.decoy_record
    }

    /// Permits currently free for new hash or verify calls.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    fn hasher(&self) -> Result<Argon2<'_>, HashPolicyError> {
        Argon2::new_with_secret(
            &self.pepper,
            Algorithm::Argon2id,
            self.version,
            self.params.clone(),
        )
        .map_err(HashPolicyError::Params)
    }

    /// Hash a plaintext password into a PHC record with a fresh salt.
    pub fn hash(&self, password: &str) -> Result<String, HashPolicyError> {
        let mut salt_bytes = vec![0u8; self.salt_length];
        OsRng.fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes).map_err(HashPolicyError::Derive)?;

        let record = self
            .hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(HashPolicyError::Derive)?;
        Ok(record.to_string())
    }

    /// Check a plaintext password against a stored PHC record.
    ///
    /// Cost parameters come from the record itself; only the pepper is
    /// taken from this policy.
    pub fn verify(&self, password: &str, record: &str) -> bool {
        let parsed = match PasswordHash::new(record) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::debug!(error = %error, "Rejected unparseable hash record");
                return false;
            }
        };
        let hasher = match self.hasher() {
            Ok(hasher) => hasher,
            Err(_) => return false,
        };

        match hasher.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(PasswordHashError::Password) => false,
            Err(error) => {
                tracing::debug!(error = %error, "Hash verification errored");
                false
            }
        }
    }

    /// Hash on the blocking pool, bounded by the concurrency permit.
    ///
    /// The permit rides into the blocking closure, so an abandoned
    /// caller cannot free admission before the work actually finishes.
    pub async fn hash_blocking(self: Arc<Self>, password: String) -> Result<String, HashPolicyError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("hash semaphore closed");
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            self.hash(&password)
        })
        .await
        .map_err(|_| HashPolicyError::Worker)?
    }

    /// Verify on the blocking pool, bounded by the concurrency permit.
    pub async fn verify_blocking(self: Arc<Self>, password: String, record: String) -> bool {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("hash semaphore closed");
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            self.verify(&password, &record)
        })
        .await
        .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cheap parameters so tests stay fast; production defaults live in
    // the config schema.
    fn fast_settings() -> PasswordSettings {
        PasswordSettings {
            salt_length: 16,
            memory_kib: 32,
            iterations: 1,
            parallelism: 1,
            output_length: 32,
            ..PasswordSettings::default()
        }
    }

    #[test]
    fn hash_then_verify_roundtrip() {
        let policy = PasswordPolicy::from_settings(&fast_settings()).unwrap();
        let record = policy.hash("correct horse battery staple").unwrap();
        assert!(policy.verify("correct horse battery staple", &record));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let policy = PasswordPolicy::from_settings(&fast_settings()).unwrap();
        let record = policy.hash("right").unwrap();
        assert!(!policy.verify("wrong", &record));
        assert!(!policy.verify("", &record));
    }

    #[test]
    fn repeated_hashes_use_fresh_salts() {
        let policy = PasswordPolicy::from_settings(&fast_settings()).unwrap();
        let first = policy.hash("same password").unwrap();
        let second = policy.hash("same password").unwrap();

        assert_ne!(first, second);
        assert!(policy.verify("same password", &first));
        assert!(policy.verify("same password", &second));
    }

    #[test]
    fn record_is_self_describing() {
        let policy = PasswordPolicy::from_settings(&fast_settings()).unwrap();
        let record = policy.hash("pw").unwrap();

        assert!(record.starts_with("$argon2id$"));
        assert!(record.contains("v=19"));
        assert!(record.contains("m=32,t=1,p=1"));
    }

    #[test]
    fn malformed_record_fails_closed() {
        let policy = PasswordPolicy::from_settings(&fast_settings()).unwrap();
        assert!(!policy.verify("pw", ""));
        assert!(!policy.verify("pw", "not a record"));
        assert!(!policy.verify("pw", "$argon2id$v=19$truncated"));
    }

    #[test]
    fn pepper_change_invalidates_stored_records() {
        let settings = fast_settings();
        let policy = PasswordPolicy::from_settings(&settings).unwrap();
        let record = policy.hash("pw").unwrap();

        let mut rotated = settings.clone();
        rotated.hash_pepper = crate::config::schema::generate_pepper();
        let other = PasswordPolicy::from_settings(&rotated).unwrap();

        assert!(!other.verify("pw", &record));
        assert!(policy.verify("pw", &record));
    }

    #[test]
    fn verification_uses_parameters_from_the_record() {
        let settings = fast_settings();
        let policy = PasswordPolicy::from_settings(&settings).unwrap();
        let record = policy.hash("pw").unwrap();

        // Same pepper, different configured costs.
        let mut retuned = settings.clone();
        retuned.memory_kib = 64;
        retuned.iterations = 2;
        let other = PasswordPolicy::from_settings(&retuned).unwrap();

        assert!(other.verify("pw", &record));
    }

    #[test]
    fn undecodable_pepper_is_rejected() {
        let mut settings = fast_settings();
        settings.hash_pepper = "!!! not base64".to_string();
        assert!(matches!(
            PasswordPolicy::from_settings(&settings),
            Err(HashPolicyError::Pepper)
        ));
    }

    #[test]
    fn short_pepper_is_rejected() {
        let mut settings = fast_settings();
        settings.hash_pepper = "c2hvcnQ=".to_string();
        assert!(matches!(
            PasswordPolicy::from_settings(&settings),
            Err(HashPolicyError::Pepper)
        ));
    }

    #[test]
    fn zero_iterations_are_rejected() {
        let mut settings = fast_settings();
        settings.iterations = 0;
        assert!(matches!(
            PasswordPolicy::from_settings(&settings),
            Err(HashPolicyError::Params(_))
        ));
    }

    #[test]
    fn unsupported_version_tag_is_rejected() {
        let mut settings = fast_settings();
        settings.version = 18;
        assert!(matches!(
            PasswordPolicy::from_settings(&settings),
            Err(HashPolicyError::Version(18))
        ));
    }

    #[test]
    fn decoy_record_matches_no_presented_password() {
        let policy = PasswordPolicy::from_settings(&fast_settings()).unwrap();

        assert!(policy.decoy_record().starts_with("$argon2id$"));
        assert!(!policy.verify("pw", policy.decoy_record()));
        assert!(!policy.verify("", policy.decoy_record()));
    }

    #[tokio::test]
    async fn abandoned_call_holds_its_permit_until_the_work_finishes() {
        let mut settings = fast_settings();
        settings.max_concurrent = 1;
        // Heavy enough that the blocking hash outlives the abort below.
        settings.memory_kib = 19_456;
        settings.iterations = 2;
        let policy = Arc::new(PasswordPolicy::from_settings(&settings).unwrap());

        let task = tokio::spawn(policy.clone().hash_blocking("pw".to_string()));
        while policy.available_permits() == 1 {
            tokio::task::yield_now().await;
        }

        task.abort();
        let _ = task.await;
        assert_eq!(
            policy.available_permits(),
            0,
            "permit must stay held while the blocking hash runs"
        );

        tokio::time::timeout(std::time::Duration::from_secs(10), async {
            while policy.available_permits() == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("permit should return once the hash completes");
    }

    #[tokio::test]
    async fn blocking_wrappers_roundtrip() {
        let policy = Arc::new(PasswordPolicy::from_settings(&fast_settings()).unwrap());

        let record = policy.clone().hash_blocking("pw".to_string()).await.unwrap();
        assert!(
            policy
                .clone()
                .verify_blocking("pw".to_string(), record.clone())
                .await
        );
        assert!(
            !policy
                .clone()
                .verify_blocking("other".to_string(), record)
                .await
        );
    }
}
