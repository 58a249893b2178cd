//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load or create config → Validate → Build policies → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger → broadcast to listener
//!     → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then policies, then the listener
//! - One broadcast channel fans the stop signal out to every task
//! - Draining is bounded; the listener forces exit after its grace
//!   period

pub mod shutdown;

pub use shutdown::Shutdown;
