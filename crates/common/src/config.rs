use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub imitation: Imitation,
    #[serde(default)]
    pub observability: Observability,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
    pub service_name: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            service_name: "history".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct History {
    pub chain_id: String,
    /// Upper bound on transfers expanded from one Ethereum record.
    pub max_nested_transfers: usize,
    pub max_concurrent_enrichments: usize,
}

impl Default for History {
    fn default() -> Self {
        Self {
            chain_id: "1".to_string(),
            max_nested_transfers: 100,
            max_concurrent_enrichments: 10,
        }
    }
}

/// Tuning for the address-poisoning heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Imitation {
    pub enabled: bool,
    pub lookup_distance: usize,
    pub prefix_length: usize,
    pub suffix_length: usize,
}

impl Default for Imitation {
    fn default() -> Self {
        Self {
            enabled: true,
            lookup_distance: 2,
            prefix_length: 3,
            suffix_length: 4,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Observability {
    pub prometheus_port: Option<u16>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse history config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let imitation = &self.imitation;
        if imitation.prefix_length + imitation.suffix_length > 40 {
            bail!(
                "imitation prefix_length + suffix_length must not exceed 40 (got {} + {})",
                imitation.prefix_length,
                imitation.suffix_length
            );
        }
        if self.history.max_concurrent_enrichments == 0 {
            bail!("history.max_concurrent_enrichments must be at least 1");
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_config() {
        let config = Config::from_toml_str(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert!(config.imitation.enabled);
        assert_eq!(config.imitation.lookup_distance, 2);
        assert_eq!(config.imitation.prefix_length, 3);
        assert_eq!(config.imitation.suffix_length, 4);
        assert_eq!(config.history.max_nested_transfers, 100);
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let toml = r#"
[imitation]
enabled = false
lookup_distance = 5
prefix_length = 2
suffix_length = 2
"#;
        let config = Config::from_toml_str(toml).unwrap();
        assert!(!config.imitation.enabled);
        assert_eq!(config.imitation.lookup_distance, 5);
        assert_eq!(config.history.chain_id, "1");
        assert!(config.observability.prometheus_port.is_none());
    }

    #[test]
    fn test_rejects_overlong_prefix_and_suffix() {
        let toml = r#"
[imitation]
enabled = true
lookup_distance = 2
prefix_length = 30
suffix_length = 11
"#;
        let err = Config::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("must not exceed 40"));
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let toml = r#"
[history]
chain_id = "137"
max_nested_transfers = 100
max_concurrent_enrichments = 0
"#;
        assert!(Config::from_toml_str(toml).is_err());
    }
}
