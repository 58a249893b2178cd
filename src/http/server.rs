//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the policy objects from a validated config
//! - Create the Axum router with all dispatch handlers
//! - Wire up middleware (timeout, request ID, tracing)
//! - Bind plaintext or TLS listener per `use_ssl`
//! - Drive graceful shutdown from the lifecycle broadcast

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{any, get, post},
    Router,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use url::Url;
use uuid::Uuid;

use crate::account::AccountStore;
use crate::config::duration::DurationParseError;
use crate::config::schema::DispatchConfig;
use crate::http::forward::Forwarder;
use crate::http::handlers;
use crate::net::tls::{ensure_keystore, TlsProvisioningError};
use crate::registry::{RegionFallback, ServerRegistry};
use crate::security::password::{HashPolicyError, PasswordPolicy};
use crate::security::token::TokenPolicy;

/// Header used to correlate one request across log lines.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Whole-request timeout for client-facing handlers.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long in-flight requests get to finish after shutdown triggers.
const DRAIN_GRACE: Duration = Duration::from_secs(30);

/// Error type for gateway construction and serving.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid bind address {addr}: {source}")]
    Addr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tls(#[from] TlsProvisioningError),

    #[error(transparent)]
    Hash(#[from] HashPolicyError),

    #[error("invalid token ttl: {0}")]
    Ttl(#[source] DurationParseError),

    #[error("invalid upstream url: {0}")]
    Upstream(#[source] url::ParseError),

    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid fallback payload: {0}")]
    Fallback(#[source] base64::DecodeError),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DispatchConfig>,
    pub registry: Arc<ServerRegistry>,
    pub password: Arc<PasswordPolicy>,
    pub tokens: Arc<TokenPolicy>,
    pub fallback: Arc<RegionFallback>,
    pub forwarder: Arc<Forwarder>,
    pub accounts: Arc<dyn AccountStore>,
}

/// HTTP server for the dispatch gateway.
pub struct GatewayServer {
    router: Router,
    config: Arc<DispatchConfig>,
}

impl GatewayServer {
    /// Build the gateway from a validated configuration and an account
    /// store collaborator.
    pub fn new(
        config: DispatchConfig,
        accounts: Arc<dyn AccountStore>,
    ) -> Result<Self, GatewayError> {
        let config = Arc::new(config);

        let registry = Arc::new(ServerRegistry::from_config(&config.servers));
        let password = Arc::new(PasswordPolicy::from_settings(&config.password)?);
        let tokens = Arc::new(TokenPolicy::from_config(&config).map_err(GatewayError::Ttl)?);
        let fallback = Arc::new(
            RegionFallback::decode(&config.query_curr_region_fallback)
                .map_err(GatewayError::Fallback)?,
        );
        let upstream =
            Url::parse(&config.query_curr_region_upstream).map_err(GatewayError::Upstream)?;
        let forwarder = Arc::new(Forwarder::new(upstream).map_err(GatewayError::Client)?);

        tracing::info!(
            servers = registry.len(),
            forward_common = config.forward_common_request,
            forward_query_curr_region = config.forward_query_curr_region,
            "Dispatch policies initialized"
        );

        let state = AppState {
            config: config.clone(),
            registry,
            password,
            tokens,
            fallback,
            forwarder,
            accounts,
        };
        let router = Self::build_router(state);

        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/status", get(handlers::status))
            .route("/query_region_list", get(handlers::query_region_list))
            .route("/query_cur_region", get(handlers::query_cur_region))
            .route("/account/login", post(handlers::login))
            .route("/account/token_login", post(handlers::token_login))
            .route("/{*path}", any(handlers::common_request))
            .route("/", any(handlers::common_request))
            .with_state(state)
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(middleware::from_fn(propagate_request_id))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown channel fires.
    ///
    /// TLS mode resolves the keystore (generating it on first run)
    /// before binding; plaintext mode never touches the keystore path.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), GatewayError> {
        let bind = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = bind.parse().map_err(|source| GatewayError::Addr {
            addr: bind.clone(),
            source,
        })?;

        if self.config.use_ssl {
            let tls = ensure_keystore(&self.config.tls).await?;
            tracing::info!(address = %addr, scheme = "https", "Dispatch gateway listening");

            let handle = axum_server::Handle::new();
            let drain = handle.clone();
            tokio::spawn(async move {
                let _ = shutdown.recv().await;
                drain.graceful_shutdown(Some(DRAIN_GRACE));
            });

            let listener = std::net::TcpListener::bind(addr)
                .map_err(|source| GatewayError::Bind { addr, source })?;
            listener
                .set_nonblocking(true)
                .map_err(|source| GatewayError::Bind { addr, source })?;

            axum_server::from_tcp_rustls(listener, tls)
                .handle(handle)
                .serve(self.router.into_make_service())
                .await
                .map_err(GatewayError::Serve)?;
        } else {
            tracing::info!(address = %addr, scheme = "http", "Dispatch gateway listening");

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|source| GatewayError::Bind { addr, source })?;

            axum::serve(listener, self.router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await
                .map_err(GatewayError::Serve)?;
        }

        tracing::info!("Dispatch gateway stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

/// Reuse a client-supplied request ID or mint one, and echo it on the
/// response.
async fn propagate_request_id(mut request: Request<Body>, next: Next) -> Response {
    let id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    match HeaderValue::from_str(&id) {
        Ok(value) => {
            request.headers_mut().insert(X_REQUEST_ID, value.clone());
            let mut response = next.run(request).await;
            response.headers_mut().insert(X_REQUEST_ID, value);
            response
        }
        Err(_) => next.run(request).await,
    }
}
