use std::path::Path;

use color_eyre::eyre::{Result, eyre};
use ::config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_API_BASE_URL: &str = "https://school-wallet-backend.onrender.com/api";
pub const DEFAULT_CONFIG_FILE: &str = "school-wallet";
pub const ENV_PREFIX: &str = "SCHOOL_WALLET";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub local_pin_check: bool,
    pub session_poll_secs: u64,
}

impl Settings {
    /// Defaults, then the optional TOML file, then `SCHOOL_WALLET_*` variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("request_timeout_secs", 30)?
            .set_default("local_pin_check", true)?
            .set_default("session_poll_secs", 60)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| eyre!("Could not load configuration: {}", e))?
            .try_deserialize()
            .map_err(|e| eyre!("Invalid configuration: {}", e))
    }
}
