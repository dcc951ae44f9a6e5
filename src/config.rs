//! TOML configuration parsing.
//!
//! Every section is optional; an empty file (or no file at all) yields a
//! runnable gateway with an empty primary index. Credentials are never read
//! here: the web and generative sections only name the environment variables
//! that adapters consult at call time, so a missing key surfaces as a
//! `NotConfigured` failure on the request that needs it rather than at startup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub primary: PrimaryConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub generative: GenerativeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_max_entries() -> usize {
    500
}
fn default_ttl_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrimaryConfig {
    /// TOML file of `[[entries]]`. Without it the primary index is empty.
    #[serde(default)]
    pub index_path: Option<PathBuf>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            index_path: None,
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_web_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_engine_id_env")]
    pub engine_id_env: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_web_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            endpoint: default_web_endpoint(),
            api_key_env: default_web_key_env(),
            engine_id_env: default_engine_id_env(),
            max_results: default_max_results(),
            timeout_secs: default_web_timeout_secs(),
        }
    }
}

fn default_web_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}
fn default_web_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}
fn default_engine_id_env() -> String {
    "GOOGLE_CSE_ID".to_string()
}
fn default_max_results() -> usize {
    5
}
fn default_web_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerativeConfig {
    #[serde(default = "default_generative_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_generative_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_generative_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_generative_endpoint(),
            api_key_env: default_generative_key_env(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            timeout_secs: default_generative_timeout_secs(),
        }
    }
}

fn default_generative_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_generative_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_tokens() -> u32 {
    512
}
fn default_max_retries() -> u32 {
    2
}
fn default_generative_timeout_secs() -> u64 {
    30
}

/// Upper bound on web results mapped into search items.
pub const WEB_RESULT_LIMIT: usize = 5;

impl Config {
    /// Replace the port of `server.bind` with `port`, keeping the host.
    pub fn apply_port(&mut self, port: u16) {
        let host = match self.server.bind.rsplit_once(':') {
            Some((host, _)) => host.to_string(),
            None => self.server.bind.clone(),
        };
        self.server.bind = format!("{}:{}", host, port);
    }

    /// Apply environment overrides (`PORT`).
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_port_override(std::env::var("PORT").ok().as_deref())
    }

    /// Apply a raw `PORT` value; `None` leaves `server.bind` untouched.
    pub fn apply_port_override(&mut self, raw: Option<&str>) -> Result<()> {
        if let Some(raw) = raw {
            let port: u16 = raw
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: '{}'", raw))?;
            self.apply_port(port);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            anyhow::bail!("cache.max_entries must be > 0");
        }
        if self.cache.ttl_secs == 0 {
            anyhow::bail!("cache.ttl_secs must be > 0");
        }
        if self.primary.max_results == 0 {
            anyhow::bail!("primary.max_results must be > 0");
        }
        if !(1..=WEB_RESULT_LIMIT).contains(&self.web.max_results) {
            anyhow::bail!("web.max_results must be in [1, {}]", WEB_RESULT_LIMIT);
        }
        if self.generative.model.trim().is_empty() {
            anyhow::bail!("generative.model must not be empty");
        }
        self.server
            .bind
            .parse::<SocketAddr>()
            .with_context(|| format!("server.bind is not a socket address: '{}'", self.server.bind))?;
        Ok(())
    }
}

/// Read and parse a TOML config file without env overrides or validation.
pub fn read_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content).with_context(|| "Failed to parse config file")
}

/// Load configuration from a TOML file, then apply env overrides and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = read_config_file(path)?;
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}

/// Load from `path` when given, otherwise start from defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => {
            let mut config = Config::default();
            config.apply_env()?;
            config.validate()?;
            Ok(config)
        }
    }
}
