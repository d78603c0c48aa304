// config.rs - Configuration for custos-core
use custos_auth::{Params, PermissionTable, BURNER, MINTER, STAKING};
use custos_common::custos_bail;
use custos_common::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Registry process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Path to the account database
    pub db_path: String,

    /// Human-readable prefix of Bech32 addresses
    pub bech32_prefix: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Module name -> granted permissions
    pub module_permissions: BTreeMap<String, Vec<String>>,

    /// Parameters applied on genesis import instead of the document's own
    pub params: Option<Params>,

    /// fsync every committed batch
    pub use_fsync: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let module_permissions = [
            ("fee_collector", vec![]),
            ("distribution", vec![]),
            ("mint", vec![MINTER]),
            ("bonded_tokens_pool", vec![BURNER, STAKING]),
            ("not_bonded_tokens_pool", vec![BURNER, STAKING]),
            ("gov", vec![BURNER]),
        ]
        .into_iter()
        .map(|(name, perms)| {
            (
                name.to_string(),
                perms.into_iter().map(str::to_string).collect(),
            )
        })
        .collect();

        Self {
            db_path: "./custos_db".to_string(),
            bech32_prefix: "cosmos".to_string(),
            log_level: "info".to_string(),
            module_permissions,
            params: None,
            use_fsync: true,
        }
    }
}

impl RegistryConfig {
    /// Load a configuration file, picking the format from its extension
    pub fn load(path: impl AsRef<Path>) -> CustosResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&text)
                .map_err(|e| CustosError::config(format!("{}: {e}", path.display())))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
                .map_err(|e| CustosError::config(format!("{}: {e}", path.display())))?,
            Some("json") => serde_json::from_str(&text)
                .map_err(|e| CustosError::config(format!("{}: {e}", path.display())))?,
            _ => {
                return Err(CustosError::config(format!(
                    "{}: unsupported config format, expected .toml, .yaml or .json",
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> CustosResult<()> {
        if self.db_path.trim().is_empty() {
            custos_bail!(Config, "db_path cannot be empty");
        }

        Bech32Codec::new(&self.bech32_prefix)?;

        for (name, permissions) in &self.module_permissions {
            if name.trim().is_empty() {
                return Err(CustosError::config("module name cannot be empty"));
            }
            if permissions.iter().any(|p| p.trim().is_empty()) {
                custos_bail!(Config, "module {} has an empty permission", name);
            }
        }

        if let Some(params) = &self.params {
            params
                .validate()
                .map_err(|e| CustosError::config(format!("params: {e}")))?;
        }

        Ok(())
    }

    /// Build the permission table from `module_permissions`
    pub fn permission_table(&self) -> CustosResult<PermissionTable> {
        PermissionTable::new(
            self.module_permissions
                .iter()
                .map(|(name, perms)| (name.clone(), perms.clone())),
        )
    }

    /// Database settings for `db_path`
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            path: self.db_path.clone(),
            use_fsync: self.use_fsync,
            ..DatabaseConfig::default()
        }
    }

    /// Get the database path as PathBuf
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.db_path)
    }
}
