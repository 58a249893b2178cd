//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, listener mode, middleware)
//!     → handlers.rs (region list, cur region, login, token login)
//!     → forward.rs (relay to upstream authority when forwarding)
//!     → Send to client
//! ```

pub mod forward;
pub mod handlers;
pub mod server;

pub use server::{AppState, GatewayError, GatewayServer, X_REQUEST_ID};
