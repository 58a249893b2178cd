//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Login request:
//!     → password.rs (peppered Argon2id verify, bounded concurrency)
//!     → token.rs (mint combo + dispatch tokens)
//!
//! Token login:
//!     → token.rs (constant-time match, expiry check)
//! ```
//!
//! # Design Decisions
//! - Fail closed: malformed records and internal errors read as
//!   authentication failure
//! - Uniform failure responses; callers never learn whether the
//!   account or the credential was wrong
//! - No trust in client input

pub mod password;
pub mod token;

pub use password::{HashPolicyError, PasswordPolicy};
pub use token::{TokenClass, TokenPolicy};
