//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON)
//!     → loader.rs (read or create, parse, default-fill)
//!     → validation.rs (semantic checks)
//!     → DispatchConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! On first run:
//!     loader.rs writes a complete default file,
//!     including a freshly generated hash pepper,
//!     before the listener starts
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so a minimal (or absent) file works
//! - Validation separates syntactic (serde) from semantic checks
//! - Older schema versions are default-filled and rewritten on load

pub mod duration;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_or_create, persist, ConfigError, LoadedConfig};
pub use schema::{DispatchConfig, PasswordSettings, ServerEntry, TlsSettings};
pub use validation::validate_config;
