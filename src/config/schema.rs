//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! dispatch gateway. All types derive Serde traits so a config file can
//! be partially specified; missing fields fall back to their defaults.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current on-disk schema version. Files with a lower version are
/// default-filled and rewritten on load; files with a higher version
/// are rejected.
pub const CONFIG_VERSION: u32 = 1;

/// Number of random bytes in a freshly generated hash pepper.
pub const PEPPER_BYTES: usize = 256;

/// Upstream authority for `query_cur_region` forwarding.
pub const DEFAULT_QUERY_CURR_REGION_UPSTREAM: &str =
    "https://cngfdispatch.yuanshen.com/query_cur_region?version=CNRELWin2.6.0&lang=2&platform=3&binary=1&time=372&channel_id=1&sub_channel_id=1&account_type=1&dispatchSeed=227fa47da8ce7dca";

/// Base64-encoded payload served for `query_cur_region` when forwarding
/// is disabled and no override is configured.
pub const DEFAULT_QUERY_CURR_REGION_FALLBACK: &str =
    "aHR0cHM6Ly9jbmdmZGlzcGF0Y2gueXVhbnNoZW4uY29tL3F1ZXJ5X2N1cl9yZWdpb24/dmVyc2lvbj1DTlJFTFdpbjIuNi4wJmxhbmc9MiZwbGF0Zm9ybT0zJmJpbmFyeT0xJnRpbWU9MzcyJmNoYW5uZWxfaWQ9MSZzdWJfY2hhbm5lbF9pZD0xJmFjY291bnRfdHlwZT0xJmRpc3BhdGNoU2VlZD0yMjdmYTQ3ZGE4Y2U3ZGNh";

/// Root configuration for the dispatch gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Schema version of this file.
    pub version: u32,

    /// Bind host for the gateway listener.
    pub host: String,

    /// Bind port for the gateway listener.
    pub port: u16,

    /// Serve HTTPS with the keystore from `tls`. When false the gateway
    /// listens in plaintext and never touches the keystore path.
    pub use_ssl: bool,

    /// Forward unmatched dispatch endpoints to the upstream authority
    /// instead of answering them locally.
    pub forward_common_request: bool,

    /// Forward `query_cur_region` to the upstream authority. When false
    /// the decoded `query_curr_region_fallback` payload is served.
    pub forward_query_curr_region: bool,

    /// Full upstream URL for `query_cur_region`. Its query string acts
    /// as the default when a client sends none.
    pub query_curr_region_upstream: String,

    /// Base64-encoded opaque payload served when region forwarding is
    /// disabled.
    pub query_curr_region_fallback: String,

    /// Game server entries advertised by `query_region_list`.
    pub servers: Vec<ServerEntry>,

    /// Combo token lifetime as a compact duration literal (e.g. "3d").
    pub combo_token_ttl: String,

    /// Dispatch token lifetime as a compact duration literal.
    pub dispatch_token_ttl: String,

    /// Credential hashing parameters.
    pub password: PasswordSettings,

    /// TLS keystore settings, used only when `use_ssl` is true.
    pub tls: TlsSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            host: "0.0.0.0".to_string(),
            port: 443,
            use_ssl: true,
            forward_common_request: true,
            forward_query_curr_region: true,
            query_curr_region_upstream: DEFAULT_QUERY_CURR_REGION_UPSTREAM.to_string(),
            query_curr_region_fallback: DEFAULT_QUERY_CURR_REGION_FALLBACK.to_string(),
            servers: vec![ServerEntry::default()],
            combo_token_ttl: "3d".to_string(),
            dispatch_token_ttl: "3d".to_string(),
            password: PasswordSettings::default(),
            tls: TlsSettings::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// A single advertised game server region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerEntry {
    /// Stable machine identifier, unique within the registry.
    pub server_name: String,

    /// Human-readable display title.
    pub title: String,

    /// Server classification (e.g. "DEV_PUBLIC").
    pub server_type: String,

    /// Domain clients use for per-region dispatch requests.
    pub dispatch_domain: String,
}

impl Default for ServerEntry {
    fn default() -> Self {
        Self {
            server_name: "sorapointa_01".to_string(),
            title: "Sorapointa".to_string(),
            server_type: "DEV_PUBLIC".to_string(),
            dispatch_domain: "localhost".to_string(),
        }
    }
}

/// Argon2id credential hashing parameters.
///
/// The pepper is generated once on first run and must stay stable
/// afterwards; rotating it invalidates every stored hash record.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PasswordSettings {
    /// Base64-encoded server-wide secret mixed into every hash. Never
    /// stored inside hash records.
    pub hash_pepper: String,

    /// Random salt length in bytes, fresh per hash.
    pub salt_length: usize,

    /// Argon2 memory cost in KiB.
    pub memory_kib: u32,

    /// Argon2 iteration count.
    pub iterations: u32,

    /// Argon2 lane count.
    pub parallelism: u32,

    /// Digest length in bytes.
    pub output_length: usize,

    /// Argon2 version tag (19 = 0x13).
    pub version: u32,

    /// Maximum hashing operations running at once.
    pub max_concurrent: usize,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            hash_pepper: generate_pepper(),
            salt_length: 48,
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 2,
            output_length: 32,
            version: 19,
            max_concurrent: 8,
        }
    }
}

impl PasswordSettings {
    /// Decode the configured pepper into raw bytes.
    pub fn decode_pepper(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.hash_pepper)
    }
}

/// Generate a fresh base64-encoded pepper from the OS RNG.
pub fn generate_pepper() -> String {
    let mut bytes = [0u8; PEPPER_BYTES];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// TLS keystore settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsSettings {
    /// Path to the keystore bundle (certificate chain + private key).
    /// Generated with a self-signed identity if absent on startup.
    pub keystore_path: PathBuf,

    /// Container format of the keystore file.
    pub format: KeystoreFormat,

    /// Name embedded in generated certificates as subject CN and SAN.
    pub key_alias: String,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            keystore_path: PathBuf::from("dispatch-cert.pem"),
            format: KeystoreFormat::Pem,
            key_alias: "dispatch".to_string(),
        }
    }
}

/// Supported keystore container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeystoreFormat {
    Pem,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
