//! Upstream forwarding client.
//!
//! In forwarding mode `query_cur_region` and common dispatch endpoints
//! are relayed to the configured upstream authority. The upstream URL
//! carries a baked-in query string that acts as the default when the
//! client sends none; a client query string replaces it wholesale.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use url::Url;

/// Total timeout for one upstream exchange.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client bound to one upstream authority.
pub struct Forwarder {
    client: reqwest::Client,
    cur_region: Url,
    base: Url,
}

/// Captured upstream response, replayed to the client as-is.
pub struct Forwarded {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Forwarder {
    pub fn new(upstream: Url) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;

        let mut base = upstream.clone();
        base.set_path("/");
        base.set_query(None);

        Ok(Self {
            client,
            cur_region: upstream,
            base,
        })
    }

    /// Forward `query_cur_region`, substituting the client query string
    /// when present.
    pub async fn query_cur_region(
        &self,
        raw_query: Option<&str>,
    ) -> Result<Forwarded, reqwest::Error> {
        self.send(self.client.get(self.cur_region_url(raw_query)))
            .await
    }

    /// Forward an arbitrary dispatch endpoint under the upstream
    /// authority, replaying the client's body and content type.
    pub async fn common(
        &self,
        method: Method,
        path: &str,
        raw_query: Option<&str>,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Forwarded, reqwest::Error> {
        let mut request = self.client.request(method, self.common_url(path, raw_query));
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        if !body.is_empty() {
            request = request.body(body);
        }
        self.send(request).await
    }

    fn cur_region_url(&self, raw_query: Option<&str>) -> Url {
        let mut url = self.cur_region.clone();
        if let Some(query) = raw_query {
            url.set_query(Some(query));
        }
        url
    }

    fn common_url(&self, path: &str, raw_query: Option<&str>) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(raw_query);
        url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Forwarded, reqwest::Error> {
        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;

        Ok(Forwarded {
            status,
            content_type,
            body,
        })
    }
}

impl IntoResponse for Forwarded {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        if let Some(content_type) = self.content_type {
            if let Ok(value) = HeaderValue::from_str(&content_type) {
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, value);
            }
        }
        response
    }
}
