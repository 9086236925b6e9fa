use serde::Deserialize;
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

///
/// Config
///
/// Database-level switches. Every section is optional in TOML and falls
/// back to its default.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub upgrade: UpgradeConfig,
    pub dynamic_types: DynamicTypesConfig,
    pub registry: RegistryConfig,
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.initial_id_capacity > usize::from(u16::MAX) + 1 {
            return Err(ConfigError::Invalid(format!(
                "registry.initial_id_capacity {} exceeds the table id range",
                self.registry.initial_id_capacity
            )));
        }

        Ok(())
    }
}

///
/// UpgradeConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UpgradeConfig {
    /// Reconcile drifted tables by adding columns. When off, stored tables
    /// are used as they are and a declared column they lack fails the load.
    pub enabled: bool,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

///
/// DynamicTypesConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DynamicTypesConfig {
    /// Materialize runtime type instances after every schema load.
    pub enabled: bool,
}

impl Default for DynamicTypesConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

///
/// RegistryConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Pre-sized slots of the id-indexed snapshot arrays.
    pub initial_id_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_id_capacity: 64,
        }
    }
}

///
/// TESTS
///
