//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters by route, auth outcome, forward result)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all log lines via middleware
//! - Metrics are cheap (atomic increments)
//! - Auth metrics record outcome only; no usernames or credentials
//!   ever reach a label

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
