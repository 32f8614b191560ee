//! Context enrichment
//!
//! Turns an identified request plus its `X-Harness-Modules` header into a
//! [`ToolFilterContext`]. No network call happens unless both the account and the
//! module header are present.

use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::domain::{AccountId, AllowedModules, RequestedModules};
use crate::filter::context::{ToolFilterContext, MODULES_HEADER};
use crate::license::LicenseResolver;
use crate::toolsets::ToolsetMapper;

/// What to do when an identified request carries no module header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingModulesPolicy {
    /// Attach no context; the request is not filtered
    #[default]
    Passthrough,
    /// Filter against every module the account is licensed for
    AllLicensed,
}

/// Builds the filtering context of a request
#[derive(Debug, Clone)]
pub struct ContextEnricher {
    resolver: Arc<LicenseResolver>,
    mapper: ToolsetMapper,
    missing_modules: MissingModulesPolicy,
}

impl ContextEnricher {
    pub fn new(resolver: Arc<LicenseResolver>, mapper: ToolsetMapper) -> Self {
        Self { resolver, mapper, missing_modules: MissingModulesPolicy::default() }
    }

    pub fn with_missing_modules_policy(mut self, policy: MissingModulesPolicy) -> Self {
        self.missing_modules = policy;
        self
    }

    pub fn resolver(&self) -> &Arc<LicenseResolver> {
        &self.resolver
    }

    pub fn mapper(&self) -> &ToolsetMapper {
        &self.mapper
    }

    pub fn missing_modules_policy(&self) -> MissingModulesPolicy {
        self.missing_modules
    }

    /// Compute the filtering context and attach it to the request extensions.
    ///
    /// Returns `None`, leaving the request untouched, when no account identity is
    /// present, or when the module header is missing or empty under
    /// [`MissingModulesPolicy::Passthrough`].
    pub async fn enrich(&self, parts: &mut Parts) -> Option<ToolFilterContext> {
        let Some(account_id) = parts.extensions.get::<AccountId>().cloned() else {
            debug!("No account identity on request, skipping tool filtering");
            return None;
        };

        let requested = parts
            .headers
            .get(MODULES_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(RequestedModules::parse)
            .unwrap_or_default();

        if requested.is_empty() && self.missing_modules == MissingModulesPolicy::Passthrough {
            debug!(account_id = %account_id, "No modules requested, skipping tool filtering");
            return None;
        }

        let unknown: Vec<&str> = requested.unknown_tokens().collect();
        if !unknown.is_empty() {
            debug!(account_id = %account_id, unknown = ?unknown, "Ignoring unknown module tokens");
        }

        let licensed = self.resolver.resolve(&account_id).await;
        let allowed_modules = if requested.is_empty() {
            AllowedModules::all_licensed(&licensed)
        } else {
            AllowedModules::compute(&requested, &licensed)
        };
        let allowed_toolsets = self.mapper.toolsets_for_modules(&allowed_modules);

        debug!(
            account_id = %account_id,
            allowed_modules = %allowed_modules,
            allowed_toolsets = %allowed_toolsets,
            "Computed allowed toolsets"
        );

        let context = ToolFilterContext { account_id, requested, allowed_modules, allowed_toolsets };
        parts.extensions.insert(context.clone());
        Some(context)
    }
}
