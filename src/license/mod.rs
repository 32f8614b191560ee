//! # License Resolution
//!
//! Determines which product modules an account is entitled to.
//!
//! - [`LicenseCache`]: account → licensed modules, with TTL and a background sweeper
//! - [`LicenseApi`] / [`HttpLicenseClient`]: the upstream License API
//! - [`LicenseResolver`]: cache lookup, lazy client, fallback on failure

pub mod cache;
pub mod client;
pub mod resolver;
pub mod types;

pub use cache::{
    LicenseCache, DEFAULT_LICENSE_CACHE_CLEAN_INTERVAL, DEFAULT_LICENSE_CACHE_TTL,
    MAX_LICENSE_CACHE_TTL,
};
pub use client::{HttpLicenseClient, LicenseApi, LicenseClientError};
pub use resolver::{licensed_modules_from_response, LicenseClientFactory, LicenseResolver};
pub use types::{AccountLicenses, AccountLicensesResponse, LicenseStatus, ModuleLicense};
