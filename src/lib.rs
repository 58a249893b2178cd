//! Dispatch Gateway Library

pub mod account;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod registry;
pub mod security;

pub use config::schema::DispatchConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
