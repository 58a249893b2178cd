//! Server registry subsystem.
//!
//! # Data Flow
//! ```text
//! DispatchConfig.servers
//!     → servers.rs (ServerRegistry, validated, order-preserving)
//!     → query_region_list responses
//!
//! DispatchConfig.query_curr_region_fallback (base64)
//!     → fallback.rs (RegionFallback, decoded once at startup)
//!     → query_cur_region responses when forwarding is off
//! ```
//!
//! # Design Decisions
//! - Registry is immutable for the process lifetime; changes require
//!   a restart like the rest of the config
//! - Response order matches config order, so operators control what
//!   clients list first

pub mod fallback;
pub mod servers;

pub use fallback::RegionFallback;
pub use servers::ServerRegistry;
