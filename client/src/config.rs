use std::fs;

use anyhow::{Context, Result};
use pizzeria::GameConfig;
use serde_derive::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    // Leave out to play offline
    pub api_url: Option<String>,
    #[serde(default)]
    pub game: GameConfig,
}

impl ClientConfig {
    pub fn from_file(file: &str) -> Result<Self> {
        let toml_string = fs::read_to_string(file)
            .with_context(|| format!("Error when trying to read the config file {}.", file))?;
        Self::from_toml_string(&toml_string)
    }

    pub fn from_toml_string(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).context("Error parsing TOML in the config file.")?;
        config.game.validate().context("Bad [game] settings in the config file.")?;
        Ok(config)
    }
}
