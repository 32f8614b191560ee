//! License resolution with cache and fallback.
//!
//! [`LicenseResolver::resolve`] never fails: a missing client, a transport error, a
//! non-200 status or an expired deadline all resolve to
//! [`LicensedModules::baseline`], and that value is cached with the same TTL as a
//! successful lookup.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::LicenseConfig;
use crate::domain::{AccountId, LicensedModules, Module};
use crate::license::cache::LicenseCache;
use crate::license::client::{HttpLicenseClient, LicenseApi, LicenseClientError};
use crate::license::types::{AccountLicensesResponse, LicenseStatus};

/// Builds the License API client on first use
pub type LicenseClientFactory =
    Box<dyn Fn() -> Result<Arc<dyn LicenseApi>, LicenseClientError> + Send + Sync>;

/// Resolves the licensed modules of an account
pub struct LicenseResolver {
    cache: Arc<LicenseCache>,
    client: RwLock<Option<Arc<dyn LicenseApi>>>,
    factory: LicenseClientFactory,
    request_timeout: Duration,
}

impl LicenseResolver {
    /// Create a resolver whose client is built lazily by `factory`
    pub fn new(
        cache: Arc<LicenseCache>,
        factory: LicenseClientFactory,
        request_timeout: Duration,
    ) -> Self {
        Self { cache, client: RwLock::new(None), factory, request_timeout }
    }

    /// Create a resolver backed by [`HttpLicenseClient`]
    pub fn from_config(cache: Arc<LicenseCache>, config: &LicenseConfig) -> Self {
        let client_config = config.clone();
        let factory: LicenseClientFactory = Box::new(move || {
            let client = HttpLicenseClient::from_config(&client_config)?;
            Ok(Arc::new(client) as Arc<dyn LicenseApi>)
        });
        Self::new(cache, factory, config.request_timeout())
    }

    /// Create a resolver around an already-built client
    pub fn with_client(
        cache: Arc<LicenseCache>,
        client: Arc<dyn LicenseApi>,
        request_timeout: Duration,
    ) -> Self {
        let factory_client = Arc::clone(&client);
        let factory: LicenseClientFactory = Box::new(move || Ok(Arc::clone(&factory_client)));
        Self { cache, client: RwLock::new(Some(client)), factory, request_timeout }
    }

    pub fn cache(&self) -> &Arc<LicenseCache> {
        &self.cache
    }

    /// Resolve the licensed modules of an account.
    ///
    /// Cache hits return without any network call. Misses call the License API once
    /// and cache whatever comes out, fallback included.
    pub async fn resolve(&self, account_id: &AccountId) -> LicensedModules {
        if let Some(modules) = self.cache.get(account_id) {
            debug!(account_id = %account_id, "License cache hit");
            return modules;
        }

        debug!(account_id = %account_id, "License cache miss, querying License API");

        let licensed = match self.fetch(account_id).await {
            Ok(response) => licensed_modules_from_response(&response),
            Err(e) => {
                warn!(
                    account_id = %account_id,
                    error = %e,
                    "License lookup failed, falling back to baseline modules"
                );
                LicensedModules::baseline()
            }
        };

        self.cache.set(account_id.clone(), licensed.clone());
        licensed
    }

    async fn fetch(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountLicensesResponse, LicenseClientError> {
        let client = self.client().await?;

        match tokio::time::timeout(self.request_timeout, client.get_account_licenses(account_id))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(LicenseClientError::Timeout(self.request_timeout)),
        }
    }

    /// Shared client, constructed at most once
    async fn client(&self) -> Result<Arc<dyn LicenseApi>, LicenseClientError> {
        {
            let guard = self.client.read().await;
            if let Some(client) = guard.as_ref() {
                return Ok(Arc::clone(client));
            }
        }

        let mut guard = self.client.write().await;
        // Another task may have built it while we waited for the write lock.
        if let Some(client) = guard.as_ref() {
            return Ok(Arc::clone(client));
        }

        let client = (self.factory)()?;
        debug!("License API client initialized");
        *guard = Some(Arc::clone(&client));
        Ok(client)
    }
}

impl fmt::Debug for LicenseResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseResolver")
            .field("cache", &self.cache)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Licensed modules described by a License API response.
///
/// Starts from the baseline; a module is added when the first record listed for it
/// is `ACTIVE`. Later records for the same module are not consulted.
pub fn licensed_modules_from_response(response: &AccountLicensesResponse) -> LicensedModules {
    let mut licensed = LicensedModules::baseline();

    let Some(data) = response.data.as_ref() else {
        return licensed;
    };

    for (module_type, licenses) in &data.all_module_licenses {
        let Some(first) = licenses.first() else {
            continue;
        };
        if first.status != LicenseStatus::Active {
            continue;
        }

        match Module::from_license_type(module_type) {
            Some(module) => {
                licensed.insert(module);
            }
            None => debug!(module_type = %module_type, "Ignoring unknown licensed module type"),
        }
    }

    licensed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::types::{AccountLicenses, ModuleLicense};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn account(id: &str) -> AccountId {
        AccountId::new(id).unwrap()
    }

    fn license(status: LicenseStatus) -> ModuleLicense {
        ModuleLicense {
            id: None,
            module_type: None,
            status,
            edition: None,
            license_type: None,
            start_time: None,
            expiry_time: None,
        }
    }

    fn response(entries: &[(&str, Vec<LicenseStatus>)]) -> AccountLicensesResponse {
        let all_module_licenses: BTreeMap<String, Vec<ModuleLicense>> = entries
            .iter()
            .map(|(module, statuses)| {
                (module.to_string(), statuses.iter().copied().map(license).collect())
            })
            .collect();

        AccountLicensesResponse {
            status: Some("SUCCESS".to_string()),
            data: Some(AccountLicenses { account_id: None, all_module_licenses }),
        }
    }

    /// Counts calls and answers with a fixed outcome
    struct MockLicenseApi {
        calls: AtomicUsize,
        outcome: Result<AccountLicensesResponse, u16>,
        delay: Option<Duration>,
    }

    impl MockLicenseApi {
        fn ok(response: AccountLicensesResponse) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), outcome: Ok(response), delay: None })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), outcome: Err(status), delay: None })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome: Ok(response(&[("CI", vec![LicenseStatus::Active])])),
                delay: Some(delay),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LicenseApi for MockLicenseApi {
        async fn get_account_licenses(
            &self,
            _account_id: &AccountId,
        ) -> Result<AccountLicensesResponse, LicenseClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.outcome {
                Ok(response) => Ok(response.clone()),
                Err(status) => Err(LicenseClientError::UnexpectedStatus { status: *status }),
            }
        }
    }

    fn resolver_with(api: Arc<MockLicenseApi>, ttl: Duration) -> LicenseResolver {
        LicenseResolver::with_client(
            Arc::new(LicenseCache::new(ttl)),
            api,
            Duration::from_secs(10),
        )
    }

    #[test]
    fn test_active_first_record_is_licensed() {
        let response = response(&[
            ("CI", vec![LicenseStatus::Active]),
            ("CD", vec![LicenseStatus::Expired, LicenseStatus::Active]),
            ("CE", vec![LicenseStatus::Active]),
            ("STO", vec![]),
            ("SOMETHING_NEW", vec![LicenseStatus::Active]),
        ]);

        let licensed = licensed_modules_from_response(&response);

        let expected: LicensedModules = [Module::Ci, Module::Ccm].into_iter().collect();
        assert_eq!(licensed, expected);
    }

    #[test]
    fn test_response_without_data_is_baseline() {
        let response = AccountLicensesResponse::default();
        assert_eq!(licensed_modules_from_response(&response), LicensedModules::baseline());
    }

    #[tokio::test]
    async fn test_resolve_caches_success() {
        let api = MockLicenseApi::ok(response(&[("CI", vec![LicenseStatus::Active])]));
        let resolver = resolver_with(Arc::clone(&api), Duration::from_secs(60));

        let first = resolver.resolve(&account("acct-1")).await;
        let second = resolver.resolve(&account("acct-1")).await;

        assert!(first.contains(Module::Ci));
        assert_eq!(first, second);
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_falls_back_and_is_cached() {
        let api = MockLicenseApi::failing(500);
        let resolver = resolver_with(Arc::clone(&api), Duration::from_secs(60));

        let first = resolver.resolve(&account("acct-1")).await;
        assert_eq!(first, LicensedModules::baseline());

        let second = resolver.resolve(&account("acct-1")).await;
        assert_eq!(second, LicensedModules::baseline());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_triggers_one_new_resolution() {
        let api = MockLicenseApi::ok(response(&[("CD", vec![LicenseStatus::Active])]));
        let resolver = resolver_with(Arc::clone(&api), Duration::from_secs(60));

        resolver.resolve(&account("acct-1")).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        resolver.resolve(&account("acct-1")).await;
        assert_eq!(api.calls(), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        resolver.resolve(&account("acct-1")).await;
        resolver.resolve(&account("acct-1")).await;
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let api = MockLicenseApi::slow(Duration::from_secs(30));
        let resolver = LicenseResolver::with_client(
            Arc::new(LicenseCache::new(Duration::from_secs(60))),
            Arc::clone(&api) as Arc<dyn LicenseApi>,
            Duration::from_secs(1),
        );

        let licensed = resolver.resolve(&account("acct-1")).await;

        assert_eq!(licensed, LicensedModules::baseline());
        assert_eq!(resolver.cache().get(&account("acct-1")), Some(LicensedModules::baseline()));
    }

    #[tokio::test]
    async fn test_client_construction_failure_falls_back() {
        let factory: LicenseClientFactory =
            Box::new(|| Err(LicenseClientError::Build("no base url".to_string())));
        let resolver = LicenseResolver::new(
            Arc::new(LicenseCache::new(Duration::from_secs(60))),
            factory,
            Duration::from_secs(10),
        );

        let licensed = resolver.resolve(&account("acct-1")).await;
        assert_eq!(licensed, LicensedModules::baseline());
        assert_eq!(resolver.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_client_is_constructed_once_under_concurrency() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let api = MockLicenseApi::ok(response(&[("CI", vec![LicenseStatus::Active])]));

        let factory_count = Arc::clone(&constructed);
        let factory_api = Arc::clone(&api);
        let factory: LicenseClientFactory = Box::new(move || {
            factory_count.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::clone(&factory_api) as Arc<dyn LicenseApi>)
        });
        let resolver = Arc::new(LicenseResolver::new(
            Arc::new(LicenseCache::new(Duration::from_secs(60))),
            factory,
            Duration::from_secs(10),
        ));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let resolver = Arc::clone(&resolver);
                tokio::spawn(async move { resolver.resolve(&account(&format!("acct-{}", i))).await })
            })
            .collect();

        for task in tasks {
            let licensed = task.await.unwrap();
            assert!(licensed.contains(Module::Ci));
        }

        assert_eq!(constructed.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls(), 16);
    }
}
