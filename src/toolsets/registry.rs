//! Module → toolset registry
//!
//! Which toolsets each product module unlocks. The table is validated once at
//! startup: every key must name a [`Module`], and toolset names must be non-empty.
//! A module absent from the table unlocks nothing.
//!
//! Keys of a configured table are matched case-insensitively, since configuration
//! sources may lowercase them. Header tokens are not.

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::domain::Module;
use crate::errors::{Error, Result};

/// Module → toolsets lookup used by the mapper
pub trait ModuleToolsets: Send + Sync {
    /// Toolsets unlocked by a module, empty if none
    fn toolsets_for_module(&self, module: Module) -> &[String];
}

/// Validated startup-time module → toolsets table
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    toolsets: HashMap<Module, Vec<String>>,
}

impl ModuleRegistry {
    /// Registry with the built-in module table
    pub fn builtin() -> Self {
        let toolsets = BUILTIN_TABLE
            .iter()
            .map(|(module, names)| (*module, names.iter().map(|name| name.to_string()).collect()))
            .collect();
        Self { toolsets }
    }

    /// Build a registry from a configured table keyed by module token
    pub fn from_table(table: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut toolsets: HashMap<Module, Vec<String>> = HashMap::with_capacity(table.len());

        for (token, names) in table {
            let module: Module = token.trim().to_ascii_uppercase().parse().map_err(|e| {
                Error::registry(format!("invalid module in toolset table: {}", e))
            })?;

            let mut validated: Vec<String> = Vec::with_capacity(names.len());
            for name in names {
                let name = name.trim();
                if name.is_empty() {
                    return Err(Error::registry(format!(
                        "module '{}' lists an empty toolset name",
                        module
                    )));
                }
                if !validated.iter().any(|existing| existing == name) {
                    validated.push(name.to_string());
                }
            }

            toolsets.insert(module, validated);
        }

        debug!(modules = toolsets.len(), "Loaded module toolset table");
        Ok(Self { toolsets })
    }

    /// Number of modules with an entry
    pub fn len(&self) -> usize {
        self.toolsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toolsets.is_empty()
    }
}

impl ModuleToolsets for ModuleRegistry {
    fn toolsets_for_module(&self, module: Module) -> &[String] {
        self.toolsets.get(&module).map(Vec::as_slice).unwrap_or(&[])
    }
}

const BUILTIN_TABLE: &[(Module, &[&str])] = &[
    // ============================================================================
    // PLATFORM
    // ============================================================================
    (
        Module::Core,
        &[
            "pipelines",
            "connectors",
            "dashboards",
            "audit",
            "logs",
            "templates",
            "access_control",
            "settings",
            "secrets",
        ],
    ),
    (Module::Unlicensed, &[]),
    // ============================================================================
    // PRODUCT MODULES
    // ============================================================================
    (Module::Ci, &["builds", "test_intelligence"]),
    (Module::Cd, &["services", "environments", "infrastructure", "releases"]),
    (Module::Ccm, &["ccm"]),
    (Module::Cf, &["feature_flags"]),
    (Module::Chaos, &["chaos"]),
    (Module::Code, &["repositories", "pullrequests"]),
    (Module::Idp, &["idp"]),
    (Module::Iacm, &["iacm"]),
    (Module::Sei, &["sei"]),
    (Module::Ssca, &["scs"]),
    (Module::Sto, &["sto"]),
    (Module::Srm, &["srm"]),
    (Module::Dbops, &["dbops"]),
    (Module::Har, &["registries"]),
];
