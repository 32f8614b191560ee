//! Account identity middleware.
//!
//! Authentication happens in front of the gateway. This layer only copies an
//! already-authenticated account id from a trusted header, or a statically
//! configured one, into the request extensions as an [`AccountId`]. An `AccountId`
//! placed by an earlier layer is never replaced.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::config::IdentityConfig;
use crate::domain::AccountId;
use crate::errors::{Error, Result};

/// Where account identities come from
#[derive(Debug, Clone)]
pub struct IdentitySource {
    header: HeaderName,
    static_account: Option<AccountId>,
}

pub type SharedIdentitySource = Arc<IdentitySource>;

impl IdentitySource {
    pub fn new(header: HeaderName, static_account: Option<AccountId>) -> Self {
        Self { header, static_account }
    }

    pub fn from_config(config: &IdentityConfig) -> Result<Self> {
        let header = HeaderName::from_bytes(config.account_header.as_bytes()).map_err(|e| {
            Error::config(format!("Invalid account header '{}': {}", config.account_header, e))
        })?;
        let static_account = match config.account_id.as_deref() {
            Some(id) => Some(
                AccountId::new(id).ok_or_else(|| Error::config("Static account id cannot be blank"))?,
            ),
            None => None,
        };

        Ok(Self::new(header, static_account))
    }

    /// Account of a request: the trusted header first, then the static account
    pub fn account_for(&self, headers: &HeaderMap) -> Option<AccountId> {
        headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .and_then(AccountId::new)
            .or_else(|| self.static_account.clone())
    }
}

/// Middleware entry point; attach with `axum::middleware::from_fn_with_state`.
pub async fn attach_account(
    State(source): State<SharedIdentitySource>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if request.extensions().get::<AccountId>().is_none() {
        match source.account_for(request.headers()) {
            Some(account_id) => {
                request.extensions_mut().insert(account_id);
            }
            None => debug!("Request carries no account identity"),
        }
    }

    next.run(request).await
}
