//! Dispatch endpoint handlers.
//!
//! Authentication failures are deliberately uniform: unknown accounts,
//! wrong passwords, stale tokens and malformed records all produce the
//! same response body, so callers cannot probe which part failed.

use std::time::SystemTime;

use axum::body::{to_bytes, Body};
use axum::extract::{RawQuery, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use crate::account::IssuedToken;
use crate::observability::metrics;
use crate::security::token::{constant_time_eq, unix_seconds, TokenClass, TokenPolicy};

use super::server::AppState;

const RETCODE_OK: i32 = 0;
const RETCODE_FAIL: i32 = -1;

const LOGIN_FAILED: &str = "account or password incorrect";
const TOKEN_FAILED: &str = "token invalid or expired";

/// Largest client body replayed upstream by the catch-all forwarder.
const FORWARD_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Gateway liveness and build info.
#[derive(Serialize)]
pub struct GatewayStatus {
    version: &'static str,
    status: &'static str,
    servers: usize,
}

pub async fn status(State(state): State<AppState>) -> Json<GatewayStatus> {
    Json(GatewayStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        servers: state.registry.len(),
    })
}

#[derive(Serialize)]
pub struct RegionListResponse {
    retcode: i32,
    regions: Vec<RegionInfo>,
}

#[derive(Serialize)]
pub struct RegionInfo {
    name: String,
    title: String,
    server_type: String,
    dispatch_url: String,
}

/// Advertise every configured region in configuration order.
pub async fn query_region_list(State(state): State<AppState>) -> Json<RegionListResponse> {
    let regions = state
        .registry
        .entries()
        .iter()
        .map(|entry| RegionInfo {
            name: entry.server_name.clone(),
            title: entry.title.clone(),
            server_type: entry.server_type.clone(),
            dispatch_url: format!("https://{}/query_cur_region", entry.dispatch_domain),
        })
        .collect();

    metrics::record_dispatch_request("query_region_list", 200);
    Json(RegionListResponse {
        retcode: RETCODE_OK,
        regions,
    })
}

/// Resolve `query_cur_region`: forward upstream or serve the baked-in
/// fallback payload.
pub async fn query_cur_region(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Response {
    if !state.config.forward_query_curr_region {
        metrics::record_dispatch_request("query_cur_region", 200);
        return (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            state.fallback.payload().to_vec(),
        )
            .into_response();
    }

    match state.forwarder.query_cur_region(query.as_deref()).await {
        Ok(forwarded) => {
            metrics::record_upstream_forward("query_cur_region", true);
            metrics::record_dispatch_request("query_cur_region", forwarded.status.as_u16());
            forwarded.into_response()
        }
        Err(error) => {
            tracing::error!(error = %error, "Upstream query_cur_region failed");
            metrics::record_upstream_forward("query_cur_region", false);
            metrics::record_dispatch_request("query_cur_region", 502);
            (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginGrant {
    retcode: i32,
    username: String,
    combo_token: String,
    combo_token_expire: u64,
    dispatch_token: String,
    dispatch_token_expire: u64,
}

#[derive(Serialize)]
struct AuthFailure {
    retcode: i32,
    message: &'static str,
}

/// Password login: verify against the stored hash record, then mint a
/// combo and a dispatch token.
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Response {
    let account = state.accounts.get(&request.username);
    let verified = match &account {
        Some(record) => {
            state
                .password
                .clone()
                .verify_blocking(request.password, record.password_hash.clone())
                .await
        }
        None => {
            // Unknown accounts burn the same hashing work as a
            // mismatch, so response timing does not reveal which
            // account names exist.
            let decoy = state.password.decoy_record().to_string();
            let _ = state
                .password
                .clone()
                .verify_blocking(request.password, decoy)
                .await;
            false
        }
    };

    if !verified {
        metrics::record_auth_attempt("password", false);
        tracing::info!(username = %request.username, "Login rejected");
        return Json(AuthFailure {
            retcode: RETCODE_FAIL,
            message: LOGIN_FAILED,
        })
        .into_response();
    }

    let now = SystemTime::now();
    let combo = IssuedToken::new(TokenPolicy::mint(), now);
    let dispatch = IssuedToken::new(TokenPolicy::mint(), now);

    if !state
        .accounts
        .record_tokens(&request.username, combo.clone(), dispatch.clone())
    {
        metrics::record_auth_attempt("password", false);
        tracing::warn!(username = %request.username, "Account disappeared during login");
        return Json(AuthFailure {
            retcode: RETCODE_FAIL,
            message: LOGIN_FAILED,
        })
        .into_response();
    }

    metrics::record_auth_attempt("password", true);
    tracing::info!(username = %request.username, "Login succeeded");
    Json(LoginGrant {
        retcode: RETCODE_OK,
        username: request.username,
        combo_token: combo.value,
        combo_token_expire: unix_seconds(state.tokens.expiry_of(TokenClass::Combo, now)),
        dispatch_token: dispatch.value,
        dispatch_token_expire: unix_seconds(state.tokens.expiry_of(TokenClass::Dispatch, now)),
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct TokenLoginRequest {
    pub username: String,
    pub combo_token: String,
}

#[derive(Serialize)]
struct TokenGrant {
    retcode: i32,
    username: String,
    combo_token_expire: u64,
}

/// Re-authenticate with a previously issued combo token.
pub async fn token_login(
    State(state): State<AppState>,
    Json(request): Json<TokenLoginRequest>,
) -> Response {
    let now = SystemTime::now();
    let account = state.accounts.get(&request.username);
    let stored = account
        .as_ref()
        .and_then(|record| record.combo_token.as_ref())
        .filter(|token| {
            constant_time_eq(&token.value, &request.combo_token)
                && state.tokens.is_valid(TokenClass::Combo, token.issued_at, now)
        });

    match stored {
        Some(token) => {
            metrics::record_auth_attempt("token", true);
            tracing::info!(username = %request.username, "Token login succeeded");
            Json(TokenGrant {
                retcode: RETCODE_OK,
                combo_token_expire: unix_seconds(
                    state.tokens.expiry_of(TokenClass::Combo, token.issued_at),
                ),
                username: request.username,
            })
            .into_response()
        }
        None => {
            metrics::record_auth_attempt("token", false);
            tracing::info!(username = %request.username, "Token login rejected");
            Json(AuthFailure {
                retcode: RETCODE_FAIL,
                message: TOKEN_FAILED,
            })
            .into_response()
        }
    }
}

/// Catch-all for the remaining dispatch endpoints: forwarded upstream
/// in forwarding mode, answered locally otherwise.
pub async fn common_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    if !state.config.forward_common_request {
        metrics::record_dispatch_request("common", 200);
        return Json(serde_json::json!({ "retcode": RETCODE_OK })).into_response();
    }

    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();
    let query = parts.uri.query().map(str::to_owned);
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let body = match to_bytes(body, FORWARD_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => {
            metrics::record_dispatch_request("common", 413);
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    match state
        .forwarder
        .common(
            parts.method,
            &path,
            query.as_deref(),
            content_type.as_deref(),
            body,
        )
        .await
    {
        Ok(forwarded) => {
            metrics::record_upstream_forward("common", true);
            metrics::record_dispatch_request("common", forwarded.status.as_u16());
            forwarded.into_response()
        }
        Err(error) => {
            tracing::error!(error = %error, path = %path, "Upstream common request failed");
            metrics::record_upstream_forward("common", false);
            metrics::record_dispatch_request("common", 502);
            (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
        }
    }
}
