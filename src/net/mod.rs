//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (use_ssl = true):
//!     → tls.rs (load keystore, or generate self-signed bundle)
//!     → TLS listener binds with the resolved identity
//!
//! Startup (use_ssl = false):
//!     → plaintext listener binds directly
//!     → keystore path is never read or created
//!
//! Keystore States:
//!     Absent → Generated → Loaded
//!     Present → Loaded
//! ```
//!
//! # Design Decisions
//! - One PEM bundle file carries certificate chain and private key
//! - Provisioning happens before the listener binds; a bad keystore
//!   is a startup failure, not a per-connection one
//! - Generated bundles are owner-readable only

pub mod tls;

pub use tls::{ensure_keystore, TlsProvisioningError};
