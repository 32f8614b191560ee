//! License API client.
//!
//! [`LicenseApi`] is the seam the resolver depends on; [`HttpLicenseClient`] is the
//! production implementation backed by `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

use crate::config::LicenseConfig;
use crate::domain::AccountId;
use crate::license::types::AccountLicensesResponse;

/// Path of the account license summary endpoint, relative to the gateway base URL
pub const ACCOUNT_LICENSES_PATH: &str = "ng/api/licenses/account";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Failures talking to the License API.
///
/// None of these reach the client: the resolver turns all of them into the
/// fallback entitlement.
#[derive(Debug, thiserror::Error)]
pub enum LicenseClientError {
    #[error("failed to build license client: {0}")]
    Build(String),

    #[error("license API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("license API returned HTTP {status}")]
    UnexpectedStatus { status: u16 },

    #[error("failed to decode license API response: {0}")]
    Decode(String),

    #[error("license API call timed out after {0:?}")]
    Timeout(Duration),
}

/// The License API as seen by the resolver.
#[async_trait]
pub trait LicenseApi: Send + Sync {
    /// Fetch the license summary of an account. Only HTTP 200 is a success.
    async fn get_account_licenses(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountLicensesResponse, LicenseClientError>;
}

/// HTTP client for the License API
#[derive(Debug, Clone)]
pub struct HttpLicenseClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpLicenseClient {
    /// Build a client from license configuration
    pub fn from_config(config: &LicenseConfig) -> Result<Self, LicenseClientError> {
        let endpoint = license_endpoint(&config.base_url)?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LicenseClientError::Build(e.to_string()))?;

        Ok(Self { client, endpoint, api_key: config.api_key.clone() })
    }

    /// Full URL of the account license endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl LicenseApi for HttpLicenseClient {
    async fn get_account_licenses(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountLicensesResponse, LicenseClientError> {
        debug!(account_id = %account_id, endpoint = %self.endpoint, "Fetching account licenses");

        let mut request = self.client.get(self.endpoint.clone()).query(&[
            ("routingId", account_id.as_str()),
            ("accountIdentifier", account_id.as_str()),
        ]);
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(LicenseClientError::UnexpectedStatus { status: status.as_u16() });
        }

        response
            .json::<AccountLicensesResponse>()
            .await
            .map_err(|e| LicenseClientError::Decode(e.to_string()))
    }
}

/// Join the license endpoint onto a base URL, tolerating a missing trailing slash
fn license_endpoint(base_url: &str) -> Result<Url, LicenseClientError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(LicenseClientError::Build("license base URL is empty".to_string()));
    }
    let normalized =
        if trimmed.ends_with('/') { trimmed.to_string() } else { format!("{}/", trimmed) };

    Url::parse(&normalized)
        .and_then(|base| base.join(ACCOUNT_LICENSES_PATH))
        .map_err(|e| LicenseClientError::Build(format!("invalid license base URL '{}': {}", trimmed, e)))
}
