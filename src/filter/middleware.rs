//! Axum middleware enforcing tool access.
//!
//! Per request: buffer the body once, classify it, and for tool requests enrich the
//! request with a [`ToolFilterContext`]. Calls are authorized before they reach the
//! next handler; `tools/list` replies are filtered after it returns. Requests that are
//! not tool requests, or that carry no filtering context, are forwarded unchanged.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, request, HeaderMap, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{debug, error, field, info_span, warn, Instrument, Span};

use crate::filter::call_authorizer::authorize_call;
use crate::filter::classifier::ToolsRequest;
use crate::filter::context::ToolFilterContext;
use crate::filter::enricher::ContextEnricher;
use crate::filter::list_filter::{
    fail_closed_body, filter_json_body, filter_sse_body, ListFailureMode,
};
use crate::mcp::error::ToolAccessError;

/// Default request body buffering limit (4 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 4 * 1024 * 1024;

/// Default `tools/list` response buffering limit (16 MiB)
pub const DEFAULT_MAX_RESPONSE_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Middleware state
#[derive(Debug, Clone)]
pub struct ToolFilter {
    enricher: ContextEnricher,
    max_body_size: usize,
    max_response_body_size: usize,
    list_failure_mode: ListFailureMode,
}

pub type SharedToolFilter = Arc<ToolFilter>;

impl ToolFilter {
    pub fn new(enricher: ContextEnricher) -> Self {
        Self {
            enricher,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_response_body_size: DEFAULT_MAX_RESPONSE_BODY_SIZE,
            list_failure_mode: ListFailureMode::default(),
        }
    }

    pub fn with_body_limits(mut self, max_body_size: usize, max_response_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self.max_response_body_size = max_response_body_size;
        self
    }

    pub fn with_list_failure_mode(mut self, mode: ListFailureMode) -> Self {
        self.list_failure_mode = mode;
        self
    }

    pub fn enricher(&self) -> &ContextEnricher {
        &self.enricher
    }

    async fn handle(&self, request: Request<Body>, next: Next) -> Response {
        if request.method() != Method::POST {
            return next.run(request).await;
        }

        let (mut parts, body) = request.into_parts();
        let bytes = match to_bytes(body, self.max_body_size).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "Failed to buffer request body");
                return ToolAccessError::BodyUnreadable(err.to_string()).into_response();
            }
        };

        let classified = ToolsRequest::classify(&bytes);
        Span::current().record("mcp.method", classified.kind());
        debug!(method = classified.kind(), "Classified request");

        if !classified.needs_filtering() {
            return forward(parts, bytes, next).await;
        }

        let Some(context) = self.enricher.enrich(&mut parts).await else {
            return forward(parts, bytes, next).await;
        };
        Span::current().record("account_id", field::display(&context.account_id));

        match classified {
            ToolsRequest::Call(call) => {
                if let Some(tool) = call.name.as_deref() {
                    Span::current().record("tool", tool);
                }
                match authorize_call(&call, &context, self.enricher.mapper()) {
                    Ok(()) => forward(parts, bytes, next).await,
                    Err(err) => err.into_response(),
                }
            }
            ToolsRequest::List { .. } => {
                let response = forward(parts, bytes, next).await;
                self.filter_list_response(response, &context).await
            }
            ToolsRequest::Batch => {
                warn!(account_id = %context.account_id, "Rejected batch request containing tool methods");
                ToolAccessError::BatchNotSupported.into_response()
            }
            ToolsRequest::Other => forward(parts, bytes, next).await,
        }
    }

    async fn filter_list_response(
        &self,
        response: Response,
        context: &ToolFilterContext,
    ) -> Response {
        if !response.status().is_success() {
            return response;
        }

        let (mut parts, body) = response.into_parts();
        let event_stream = is_event_stream(&parts.headers);

        let bytes = match to_bytes(body, self.max_response_body_size).await {
            Ok(bytes) => bytes,
            Err(err) => {
                // The body is gone at this point, so there is nothing to fail open with.
                error!(error = %err, "Failed to buffer tools/list response, returning empty tool list");
                parts.headers.remove(header::CONTENT_LENGTH);
                return Response::from_parts(parts, Body::from(fail_closed_body(&[], event_stream)));
            }
        };

        let allowed = &context.allowed_toolsets;
        let mapper = self.enricher.mapper();
        let filtered = if event_stream {
            filter_sse_body(&bytes, allowed, mapper)
        } else {
            filter_json_body(&bytes, allowed, mapper)
        };

        match filtered {
            Ok(body) => {
                debug!(account_id = %context.account_id, "Filtered tools/list response");
                parts.headers.remove(header::CONTENT_LENGTH);
                Response::from_parts(parts, Body::from(body))
            }
            Err(err) => match self.list_failure_mode {
                ListFailureMode::Open => {
                    error!(error = %err, "Failed to filter tools/list response, returning it unfiltered");
                    Response::from_parts(parts, Body::from(bytes))
                }
                ListFailureMode::Closed => {
                    error!(error = %err, "Failed to filter tools/list response, returning empty tool list");
                    parts.headers.remove(header::CONTENT_LENGTH);
                    Response::from_parts(parts, Body::from(fail_closed_body(&bytes, event_stream)))
                }
            },
        }
    }
}

/// Middleware entry point; attach with `axum::middleware::from_fn_with_state`.
pub async fn filter_tool_requests(
    State(filter): State<SharedToolFilter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let span = info_span!(
        "tool_filter",
        http.path = %request.uri().path(),
        mcp.method = field::Empty,
        account_id = field::Empty,
        tool = field::Empty
    );

    filter.handle(request, next).instrument(span).await
}

async fn forward(parts: request::Parts, bytes: Bytes, next: Next) -> Response {
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|mime| mime.essence_str() == mime::TEXT_EVENT_STREAM.essence_str())
}
