//! Pre-baked region query response.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Pre-decoded opaque payload served for `query_cur_region` when
/// upstream forwarding is disabled.
#[derive(Debug, Clone)]
pub struct RegionFallback {
    payload: Vec<u8>,
}

impl RegionFallback {
    /// Decode the configured base64 literal once.
    pub fn decode(literal: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self {
            payload: STANDARD.decode(literal)?,
        })
    }

    /// The frozen payload bytes, served verbatim.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
