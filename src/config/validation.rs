//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check registry integrity (non-empty, unique server names)
//! - Validate hashing parameters against supported ranges
//! - Validate duration literals, upstream URL and fallback payload
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: DispatchConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::duration::{parse_duration, DurationParseError};
use crate::config::schema::{DispatchConfig, CONFIG_VERSION};
use crate::security::password::{
    MAX_OUTPUT_LENGTH, MAX_SALT_LENGTH, MIN_OUTPUT_LENGTH, MIN_PEPPER_LENGTH, MIN_SALT_LENGTH,
};

/// A single semantic configuration defect.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("config version {0} is newer than supported version {CONFIG_VERSION}")]
    UnsupportedVersion(u32),

    #[error("host must not be empty")]
    EmptyHost,

    #[error("servers list must contain at least one entry")]
    NoServers,

    #[error("server `{0}`: {1} must not be empty")]
    EmptyServerField(String, &'static str),

    #[error("duplicate server name `{0}`")]
    DuplicateServerName(String),

    #[error("{field}: {source}")]
    InvalidTtl {
        field: &'static str,
        #[source]
        source: DurationParseError,
    },

    #[error("password.hash_pepper {0}")]
    InvalidPepper(String),

    #[error("password.salt_length {0} outside supported range {MIN_SALT_LENGTH}..={MAX_SALT_LENGTH}")]
    SaltLength(usize),

    #[error("password.output_length {0} outside supported range {MIN_OUTPUT_LENGTH}..={MAX_OUTPUT_LENGTH}")]
    OutputLength(usize),

    #[error("password.{0} must be greater than zero")]
    ZeroParameter(&'static str),

    #[error("password.memory_kib {memory_kib} must be at least 8x parallelism ({parallelism})")]
    MemoryTooLow { memory_kib: u32, parallelism: u32 },

    #[error("password.version {0} is not a supported argon2 version tag (16 or 19)")]
    HashVersion(u32),

    #[error("query_curr_region_upstream is not a valid URL: {0}")]
    InvalidUpstream(#[source] url::ParseError),

    #[error("query_curr_region_upstream must use http or https, got `{0}`")]
    UpstreamScheme(String),

    #[error("query_curr_region_fallback is not valid base64: {0}")]
    InvalidFallback(#[source] base64::DecodeError),

    #[error("tls.keystore_path must not be empty when use_ssl is true")]
    EmptyKeystorePath,

    #[error("tls.key_alias must not be empty when use_ssl is true")]
    EmptyKeyAlias,

    #[error("observability.metrics_address is not a valid socket address: {0}")]
    InvalidMetricsAddress(#[source] std::net::AddrParseError),
}

/// Validate a configuration, collecting every defect found.
pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.version > CONFIG_VERSION {
        errors.push(ValidationError::UnsupportedVersion(config.version));
    }
    if config.host.is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    validate_servers(config, &mut errors);
    validate_ttls(config, &mut errors);
    validate_password(config, &mut errors);
    validate_region_sources(config, &mut errors);

    if config.use_ssl {
        if config.tls.keystore_path.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyKeystorePath);
        }
        if config.tls.key_alias.is_empty() {
            errors.push(ValidationError::EmptyKeyAlias);
        }
    }

    if config.observability.metrics_enabled {
        if let Err(source) = config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
        {
            errors.push(ValidationError::InvalidMetricsAddress(source));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_servers(config: &DispatchConfig, errors: &mut Vec<ValidationError>) {
    if config.servers.is_empty() {
        errors.push(ValidationError::NoServers);
        return;
    }

    let mut seen = HashSet::new();
    for server in &config.servers {
        if server.server_name.is_empty() {
            errors.push(ValidationError::EmptyServerField(
                server.title.clone(),
                "server_name",
            ));
            continue;
        }
        if server.dispatch_domain.is_empty() {
            errors.push(ValidationError::EmptyServerField(
                server.server_name.clone(),
                "dispatch_domain",
            ));
        }
        if !seen.insert(server.server_name.as_str()) {
            errors.push(ValidationError::DuplicateServerName(
                server.server_name.clone(),
            ));
        }
    }
}

fn validate_ttls(config: &DispatchConfig, errors: &mut Vec<ValidationError>) {
    for (field, literal) in [
        ("combo_token_ttl", &config.combo_token_ttl),
        ("dispatch_token_ttl", &config.dispatch_token_ttl),
    ] {
        if let Err(source) = parse_duration(literal) {
            errors.push(ValidationError::InvalidTtl { field, source });
        }
    }
}

fn validate_password(config: &DispatchConfig, errors: &mut Vec<ValidationError>) {
    let password = &config.password;

    match password.decode_pepper() {
        Ok(pepper) if pepper.len() < MIN_PEPPER_LENGTH => {
            errors.push(ValidationError::InvalidPepper(format!(
                "decodes to {} bytes, need at least {MIN_PEPPER_LENGTH}",
                pepper.len()
            )));
        }
        Ok(_) => {}
        Err(source) => {
            errors.push(ValidationError::InvalidPepper(format!(
                "is not valid base64: {source}"
            )));
        }
    }

    if !(MIN_SALT_LENGTH..=MAX_SALT_LENGTH).contains(&password.salt_length) {
        errors.push(ValidationError::SaltLength(password.salt_length));
    }
    if !(MIN_OUTPUT_LENGTH..=MAX_OUTPUT_LENGTH).contains(&password.output_length) {
        errors.push(ValidationError::OutputLength(password.output_length));
    }
    if password.iterations == 0 {
        errors.push(ValidationError::ZeroParameter("iterations"));
    }
    if password.parallelism == 0 {
        errors.push(ValidationError::ZeroParameter("parallelism"));
    } else if password.memory_kib < 8 * password.parallelism {
        errors.push(ValidationError::MemoryTooLow {
            memory_kib: password.memory_kib,
            parallelism: password.parallelism,
        });
    }
    if password.max_concurrent == 0 {
        errors.push(ValidationError::ZeroParameter("max_concurrent"));
    }
    if password.version != 16 && password.version != 19 {
        errors.push(ValidationError::HashVersion(password.version));
    }
}

fn validate_region_sources(config: &DispatchConfig, errors: &mut Vec<ValidationError>) {
    match Url::parse(&config.query_curr_region_upstream) {
        Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
            errors.push(ValidationError::UpstreamScheme(url.scheme().to_string()));
        }
        Ok(_) => {}
        Err(source) => errors.push(ValidationError::InvalidUpstream(source)),
    }

    use base64::{engine::general_purpose::STANDARD, Engine as _};
    if let Err(source) = STANDARD.decode(&config.query_curr_region_fallback) {
        errors.push(ValidationError::InvalidFallback(source));
    }
}
