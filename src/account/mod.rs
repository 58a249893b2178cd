//! Account records and token storage.
//!
//! # Data Flow
//! ```text
//! Login request:
//!     → store.rs (look up AccountRecord by username)
//!     → password verify, token mint
//!     → store.rs (persist freshly issued tokens)
//!
//! Token login:
//!     → store.rs (look up stored combo token)
//! ```
//!
//! # Design Decisions
//! - The gateway does not own account provisioning; it consumes an
//!   AccountStore collaborator behind a trait
//! - The in-memory implementation backs standalone deployments and
//!   tests; a database-backed store plugs in without gateway changes

pub mod store;
pub mod types;

pub use store::{AccountStore, MemoryAccountStore};
pub use types::{AccountRecord, IssuedToken};
