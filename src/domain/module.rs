//! Product modules and the module sets derived from them.
//!
//! Three sets flow through a filtered request:
//!
//! - [`RequestedModules`]: what the client asked for in `X-Harness-Modules`
//! - [`LicensedModules`]: what the account is entitled to (always has `CORE` and `UNLICENSED`)
//! - [`AllowedModules`]: requested ∩ licensed, always with `CORE`

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A product entitlement unit.
///
/// Tokens are case-sensitive and match the upper-case names used by the license
/// ledger and the `X-Harness-Modules` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Module {
    Core,
    Unlicensed,
    Ci,
    Cd,
    Ccm,
    Cf,
    Chaos,
    Code,
    Iacm,
    Idp,
    Sei,
    Ssca,
    Sto,
    Srm,
    Dbops,
    Har,
}

impl Module {
    /// Every known module, in declaration order
    pub const ALL: [Module; 16] = [
        Module::Core,
        Module::Unlicensed,
        Module::Ci,
        Module::Cd,
        Module::Ccm,
        Module::Cf,
        Module::Chaos,
        Module::Code,
        Module::Iacm,
        Module::Idp,
        Module::Sei,
        Module::Ssca,
        Module::Sto,
        Module::Srm,
        Module::Dbops,
        Module::Har,
    ];

    /// Canonical token for this module
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Core => "CORE",
            Module::Unlicensed => "UNLICENSED",
            Module::Ci => "CI",
            Module::Cd => "CD",
            Module::Ccm => "CCM",
            Module::Cf => "CF",
            Module::Chaos => "CHAOS",
            Module::Code => "CODE",
            Module::Iacm => "IACM",
            Module::Idp => "IDP",
            Module::Sei => "SEI",
            Module::Ssca => "SSCA",
            Module::Sto => "STO",
            Module::Srm => "SRM",
            Module::Dbops => "DBOPS",
            Module::Har => "HAR",
        }
    }

    /// Parse a header token. Case-sensitive; unknown tokens yield `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        Module::ALL.into_iter().find(|module| module.as_str() == token)
    }

    /// Parse a module type as reported by the license ledger.
    ///
    /// The ledger reports cloud cost management as `CE`, the registry calls it `CCM`.
    pub fn from_license_type(module_type: &str) -> Option<Self> {
        match module_type {
            "CE" => Some(Module::Ccm),
            other => Module::from_token(other),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known module
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown module '{0}'")]
pub struct UnknownModule(pub String);

impl FromStr for Module {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::from_token(s).ok_or_else(|| UnknownModule(s.to_string()))
    }
}

/// Module tokens requested by the client, in header order.
///
/// Parsed from a comma-separated header value: entries are trimmed, empty entries
/// dropped and duplicates collapsed to their first occurrence. Tokens that do not
/// name a known module are kept so the request context records what was asked for,
/// but they never contribute a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedModules {
    tokens: Vec<String>,
}

impl RequestedModules {
    /// Parse a raw `X-Harness-Modules` header value
    pub fn parse(header_value: &str) -> Self {
        let mut tokens: Vec<String> = Vec::new();
        for token in header_value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !tokens.iter().any(|existing| existing == token) {
                tokens.push(token.to_string());
            }
        }
        Self { tokens }
    }

    /// Raw tokens in request order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Known modules among the requested tokens, in request order
    pub fn modules(&self) -> impl Iterator<Item = Module> + '_ {
        self.tokens.iter().filter_map(|token| Module::from_token(token))
    }

    /// Tokens that did not name a known module
    pub fn unknown_tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.tokens.iter().map(String::as_str).filter(|token| Module::from_token(token).is_none())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

/// Modules an account is entitled to.
///
/// `CORE` and `UNLICENSED` are always present, whatever the license ledger says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicensedModules {
    modules: BTreeSet<Module>,
}

impl LicensedModules {
    /// The minimal entitlement: `{CORE, UNLICENSED}`.
    ///
    /// Also the fallback value when the License API cannot be reached.
    pub fn baseline() -> Self {
        Self { modules: BTreeSet::from([Module::Core, Module::Unlicensed]) }
    }

    pub fn insert(&mut self, module: Module) -> bool {
        self.modules.insert(module)
    }

    pub fn contains(&self, module: Module) -> bool {
        self.modules.contains(&module)
    }

    pub fn iter(&self) -> impl Iterator<Item = Module> + '_ {
        self.modules.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Always false: the baseline modules cannot be removed
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for LicensedModules {
    fn default() -> Self {
        Self::baseline()
    }
}

impl FromIterator<Module> for LicensedModules {
    fn from_iter<I: IntoIterator<Item = Module>>(iter: I) -> Self {
        let mut licensed = Self::baseline();
        licensed.modules.extend(iter);
        licensed
    }
}

/// Modules a request may use. Always contains `CORE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedModules {
    modules: BTreeSet<Module>,
}

impl AllowedModules {
    /// `(requested ∩ licensed) ∪ {CORE}`
    pub fn compute(requested: &RequestedModules, licensed: &LicensedModules) -> Self {
        let mut modules: BTreeSet<Module> =
            requested.modules().filter(|module| licensed.contains(*module)).collect();
        modules.insert(Module::Core);
        Self { modules }
    }

    /// `licensed ∪ {CORE}`, used when the client did not narrow the module set
    pub fn all_licensed(licensed: &LicensedModules) -> Self {
        let mut modules: BTreeSet<Module> = licensed.iter().collect();
        modules.insert(Module::Core);
        Self { modules }
    }

    pub fn contains(&self, module: Module) -> bool {
        self.modules.contains(&module)
    }

    pub fn iter(&self) -> impl Iterator<Item = Module> + '_ {
        self.modules.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Always false: `CORE` is always allowed
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Display for AllowedModules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.modules.iter().map(Module::as_str).collect();
        write!(f, "{}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_module_tokens_are_case_sensitive() {
        assert_eq!(Module::from_token("CI"), Some(Module::Ci));
        assert_eq!(Module::from_token("ci"), None);
        assert_eq!(Module::from_token("Ci"), None);
    }

    #[test]
    fn test_module_tokens_roundtrip_for_all_variants() {
        for module in Module::ALL {
            assert_eq!(Module::from_token(module.as_str()), Some(module));
            assert_eq!(module.as_str().parse::<Module>(), Ok(module));
        }
    }

    #[test]
    fn test_module_serde_uses_tokens() {
        assert_eq!(serde_json::to_string(&Module::Unlicensed).unwrap(), "\"UNLICENSED\"");
        assert_eq!(serde_json::from_str::<Module>("\"DBOPS\"").unwrap(), Module::Dbops);
    }

    #[test]
    fn test_license_type_remaps_ce_to_ccm() {
        assert_eq!(Module::from_license_type("CE"), Some(Module::Ccm));
        assert_eq!(Module::from_license_type("CCM"), Some(Module::Ccm));
        assert_eq!(Module::from_license_type("CD"), Some(Module::Cd));
        assert_eq!(Module::from_license_type("NOT_A_MODULE"), None);
    }

    #[test]
    fn test_unknown_module_error() {
        let err = "XYZ".parse::<Module>().unwrap_err();
        assert_eq!(err.to_string(), "unknown module 'XYZ'");
    }

    #[test]
    fn test_requested_modules_parsing() {
        let requested = RequestedModules::parse(" CI, CD ,,CI, ccm ,");
        assert_eq!(requested.tokens(), &["CI", "CD", "ccm"]);
        assert_eq!(requested.modules().collect::<Vec<_>>(), vec![Module::Ci, Module::Cd]);
        assert_eq!(requested.unknown_tokens().collect::<Vec<_>>(), vec!["ccm"]);
    }

    #[test]
    fn test_requested_modules_empty_header() {
        assert!(RequestedModules::parse("").is_empty());
        assert!(RequestedModules::parse(" , ,").is_empty());
    }

    #[test]
    fn test_licensed_modules_always_have_sentinels() {
        let licensed: LicensedModules = [Module::Ci].into_iter().collect();
        assert!(licensed.contains(Module::Core));
        assert!(licensed.contains(Module::Unlicensed));
        assert!(licensed.contains(Module::Ci));
        assert_eq!(licensed.len(), 3);
    }

    #[test]
    fn test_allowed_modules_intersection_drops_unlicensed_requests() {
        // licensed = [CORE, CI], header "CI,CD" => {CI, CORE}
        let licensed: LicensedModules = [Module::Ci].into_iter().collect();
        let requested = RequestedModules::parse("CI,CD");

        let allowed = AllowedModules::compute(&requested, &licensed);

        assert_eq!(allowed.iter().collect::<Vec<_>>(), vec![Module::Core, Module::Ci]);
        assert!(!allowed.contains(Module::Cd));
        assert_eq!(allowed.to_string(), "CORE,CI");
    }

    #[test]
    fn test_allowed_modules_sentinel_is_not_requested() {
        let licensed = LicensedModules::baseline();
        let requested = RequestedModules::parse("CD");

        let allowed = AllowedModules::compute(&requested, &licensed);

        assert_eq!(allowed.iter().collect::<Vec<_>>(), vec![Module::Core]);
    }

    #[test]
    fn test_allowed_modules_all_licensed() {
        let licensed: LicensedModules = [Module::Cd, Module::Sto].into_iter().collect();
        let allowed = AllowedModules::all_licensed(&licensed);
        assert!(allowed.contains(Module::Core));
        assert!(allowed.contains(Module::Unlicensed));
        assert!(allowed.contains(Module::Cd));
        assert!(allowed.contains(Module::Sto));
    }

    fn any_module() -> impl Strategy<Value = Module> {
        proptest::sample::select(Module::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_core_always_allowed(
            requested in proptest::collection::vec(any_module(), 0..8),
            licensed in proptest::collection::vec(any_module(), 0..8),
        ) {
            let header = requested.iter().map(Module::as_str).collect::<Vec<_>>().join(",");
            let requested = RequestedModules::parse(&header);
            let licensed: LicensedModules = licensed.into_iter().collect();

            let allowed = AllowedModules::compute(&requested, &licensed);

            prop_assert!(allowed.contains(Module::Core));
            for module in allowed.iter().filter(|m| *m != Module::Core) {
                prop_assert!(licensed.contains(module));
                prop_assert!(requested.modules().any(|r| r == module));
            }
        }
    }
}
