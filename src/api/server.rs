use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    response::Json,
    routing::{any, get, MethodRouter},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::identity::{attach_account, IdentitySource, SharedIdentitySource};
use crate::api::proxy::{proxy_to_upstream, UpstreamProxy};
use crate::config::AppConfig;
use crate::errors::{Error, Result};
use crate::filter::{filter_tool_requests, ContextEnricher, SharedToolFilter, ToolFilter};
use crate::license::{LicenseCache, LicenseResolver};
use crate::toolsets::{ModuleRegistry, ToolGroupTracker, ToolsetMapper};

/// Liveness endpoint, served outside the tool filter
pub const HEALTH_PATH: &str = "/health";

/// Wire the filtering pipeline from configuration.
///
/// The license cache sweeper is not started here; see [`start_server`].
pub fn build_tool_filter(config: &AppConfig) -> Result<ToolFilter> {
    let registry = if config.toolsets.is_empty() {
        ModuleRegistry::builtin()
    } else {
        ModuleRegistry::from_table(&config.toolsets)?
    };

    let tracker = ToolGroupTracker::from_table(&config.tool_groups)?;
    if tracker.is_empty() {
        warn!("No tool groups configured; tools/call requests under a filtering context will be denied");
    }
    info!(modules = registry.len(), tools = tracker.len(), "Initialized toolset registry");

    let mapper = ToolsetMapper::new(Arc::new(registry), Arc::new(tracker));
    let cache = Arc::new(LicenseCache::new(config.license.cache_ttl()));
    let resolver = Arc::new(LicenseResolver::from_config(cache, &config.license));
    let enricher = ContextEnricher::new(resolver, mapper)
        .with_missing_modules_policy(config.filter.missing_modules_header);

    Ok(ToolFilter::new(enricher)
        .with_body_limits(config.server.max_body_size, config.filter.max_response_body_size)
        .with_list_failure_mode(config.filter.list_failure_mode))
}

/// Assemble the gateway router.
///
/// Requests to `mcp_path` pass identity, then the tool filter, then `upstream`.
pub fn build_router(
    mcp_path: &str,
    identity: SharedIdentitySource,
    filter: SharedToolFilter,
    upstream: MethodRouter,
) -> Router {
    Router::new()
        .route(mcp_path, upstream)
        .layer(from_fn_with_state(filter, filter_tool_requests))
        .layer(from_fn_with_state(identity, attach_account))
        .route(HEALTH_PATH, get(health))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

/// Start the gateway and serve until Ctrl-C
pub async fn start_server(config: AppConfig) -> Result<()> {
    let filter = Arc::new(build_tool_filter(&config)?);
    let sweeper =
        filter.enricher().resolver().cache().spawn_sweeper(config.license.cache_clean_interval());

    let identity = Arc::new(IdentitySource::from_config(&config.identity)?);
    let proxy = Arc::new(UpstreamProxy::from_config(&config.upstream)?);
    let router = build_router(
        &config.server.mcp_path,
        identity,
        filter,
        any(proxy_to_upstream).with_state(proxy),
    );

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| Error::transport(format!("Failed to bind gateway on {}: {}", address, e)))?;

    info!(address = %address, mcp_path = %config.server.mcp_path, "Starting toolgate gateway");
    let result = run_http_server(listener, router).await;

    sweeper.abort();
    info!("Gateway shutdown completed");
    result
}

async fn run_http_server(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Gateway shutdown listener failed");
            }
        })
        .await
        .map_err(|e| Error::transport(format!("Gateway server error: {}", e)))
}
