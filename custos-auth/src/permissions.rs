//! Module permission table
//!
//! Built once from the module-name -> permissions configuration and
//! read-only afterwards.

use custos_common::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A module's derived address together with its granted permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsForAddress {
    /// Module name
    pub name: String,
    /// Address derived from the module name
    pub address: Address,
    /// Granted permissions, in declaration order
    pub permissions: Vec<String>,
}

impl PermissionsForAddress {
    /// Derive the module address and record its permissions
    pub fn new(name: impl Into<String>, permissions: Vec<String>) -> Self {
        let name = name.into();
        Self {
            address: CryptoUtils::module_address(&name),
            name,
            permissions,
        }
    }

    /// Whether `permission` is granted
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Immutable map from module name to [`PermissionsForAddress`]
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    by_name: BTreeMap<String, PermissionsForAddress>,
}

impl PermissionTable {
    /// Build the table, rejecting blank names, blank or duplicate
    /// permissions, repeated module names, and module names whose derived
    /// addresses collide.
    pub fn new<I, N, P, S>(modules: I) -> CustosResult<Self>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut by_name = BTreeMap::new();
        let mut owners: BTreeMap<Address, String> = BTreeMap::new();

        for (name, permissions) in modules {
            let name = name.into();
            let permissions: Vec<String> = permissions.into_iter().map(Into::into).collect();

            ValidationUtils::validate_module_name(&name)
                .map_err(|e| CustosError::config(e.to_string()))?;
            ValidationUtils::validate_permissions(&permissions)
                .map_err(|e| CustosError::config(format!("module {name}: {e}")))?;

            let entry = PermissionsForAddress::new(name.clone(), permissions);
            if let Some(owner) = owners.insert(entry.address, name.clone()) {
                if owner == name {
                    return Err(CustosError::config(format!(
                        "module {name} configured more than once"
                    )));
                }
                return Err(CustosError::config(format!(
                    "modules {owner} and {name} derive the same address {}",
                    entry.address
                )));
            }
            by_name.insert(name, entry);
        }

        Ok(Self { by_name })
    }

    /// Empty table: no module accounts configured
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a module
    pub fn lookup(&self, module_name: &str) -> CustosResult<&PermissionsForAddress> {
        self.by_name
            .get(module_name)
            .ok_or_else(|| CustosError::unknown_module(module_name))
    }

    /// Look up a module, `None` if it is not configured
    pub fn get(&self, module_name: &str) -> Option<&PermissionsForAddress> {
        self.by_name.get(module_name)
    }

    /// Derived address of a configured module
    pub fn module_address(&self, module_name: &str) -> Option<Address> {
        self.by_name.get(module_name).map(|entry| entry.address)
    }

    /// Derived address and granted permissions of a configured module
    pub fn module_address_and_permissions(
        &self,
        module_name: &str,
    ) -> Option<(Address, &[String])> {
        self.by_name
            .get(module_name)
            .map(|entry| (entry.address, entry.permissions.as_slice()))
    }

    /// Whether `module_name` is configured with `permission`
    pub fn has_permission(&self, module_name: &str, permission: &str) -> bool {
        self.by_name
            .get(module_name)
            .is_some_and(|entry| entry.has_permission(permission))
    }

    /// Module owning `address`, if any
    pub fn module_for_address(&self, address: &Address) -> Option<&PermissionsForAddress> {
        self.by_name.values().find(|entry| entry.address == *address)
    }

    /// Configured module names in ascending order
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// All entries in ascending module-name order
    pub fn iter(&self) -> impl Iterator<Item = &PermissionsForAddress> {
        self.by_name.values()
    }

    /// Number of configured modules
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True when no module is configured
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
