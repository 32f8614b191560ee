//! Upstream MCP proxy
//!
//! Terminal handler of the MCP route. Requests that survived the tool filter are
//! forwarded to the configured upstream server and its reply is streamed back.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use reqwest::Url;
use tracing::{debug, error};

use crate::config::UpstreamConfig;
use crate::errors::{Error, Result};
use crate::mcp::error::ToolAccessError;

/// Connection-scoped headers that must not cross the proxy
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Forwards MCP traffic to the upstream server
#[derive(Debug, Clone)]
pub struct UpstreamProxy {
    client: reqwest::Client,
    url: Url,
}

pub type SharedUpstreamProxy = Arc<UpstreamProxy>;

impl UpstreamProxy {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        let url = Url::parse(&config.url)
            .map_err(|e| Error::config(format!("Invalid upstream URL '{}': {}", config.url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::transport(format!("Failed to build upstream client: {}", e)))?;

        Ok(Self::new(client, url))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Forward a request and stream the upstream reply back
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();

        let mut url = self.url.clone();
        if let Some(query) = parts.uri.query() {
            url.set_query(Some(query));
        }

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::ACCEPT_ENCODING);

        debug!(method = %parts.method, upstream = %url, "Forwarding request upstream");

        let upstream = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(reqwest::Body::wrap_stream(body.into_data_stream()))
            .send()
            .await;

        match upstream {
            Ok(upstream) => {
                let status = upstream.status();
                let mut headers = upstream.headers().clone();
                strip_hop_by_hop(&mut headers);

                let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
                *response.status_mut() = status;
                *response.headers_mut() = headers;
                response
            }
            Err(e) => {
                error!(error = %e, upstream = %self.url, timed_out = e.is_timeout(), "Upstream request failed");
                ToolAccessError::UpstreamUnavailable.into_response()
            }
        }
    }
}

/// Handler of the MCP route
pub async fn proxy_to_upstream(
    State(proxy): State<SharedUpstreamProxy>,
    request: Request<Body>,
) -> Response {
    proxy.forward(request).await
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }
}
