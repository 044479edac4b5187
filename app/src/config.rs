use std::fs;

use anyhow::{Context, Result};
use serde_derive::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkConfig {
    pub ip: String,
    pub port: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageConfig {
    pub db_file: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GateConfig {
    // Empty lets everybody in
    #[serde(default)]
    pub allowed_ips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

impl Config {
    pub fn from_file(file: &str) -> Result<Self> {
        let toml_string = fs::read_to_string(file).with_context(|| {
            format!(
                "Error when trying to read the config file {}. \
                Make sure stats.toml is in /config directory.",
                file
            )
        })?;
        Self::from_toml_string(&toml_string)
    }

    pub fn from_toml_string(input: &str) -> Result<Self> {
        toml::from_str(input).context("Error parsing TOML in the config file.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_config() {
        let config = Config::from_toml_string(
            r###"
[network]
ip = "1.1.1.1"
port = 1234

[storage]
db_file = "./runs.db"

[gate]
allowed_ips = ["58.84.60.21"]
"###,
        )
        .unwrap();
        assert_eq!(
            config,
            Config {
                network: NetworkConfig {
                    ip: "1.1.1.1".into(),
                    port: 1234
                },
                storage: StorageConfig {
                    db_file: "./runs.db".into()
                },
                gate: GateConfig {
                    allowed_ips: vec!["58.84.60.21".into()]
                },
            }
        );
    }

    #[test]
    fn test_gate_is_optional() {
        let config = Config::from_toml_string(
            r###"
[network]
ip = "0.0.0.0"
port = 3000

[storage]
db_file = "./runs.db"
"###,
        )
        .unwrap();
        assert!(config.gate.allowed_ips.is_empty());
    }

    #[test]
    fn test_missing_section() {
        assert!(Config::from_toml_string("[network]\nip = \"0.0.0.0\"\nport = 1").is_err());
    }
}
