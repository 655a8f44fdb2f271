//! Gateway Configuration
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! The default file location follows the XDG Base Directory specification:
//! `$XDG_CONFIG_HOME/chat-gateway/gateway.toml`.
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//! session_queue_capacity = 16
//!
//! [upstream]
//! base_url = "http://ollama:11434"
//! model = "tinyllama"
//! read_timeout_secs = 120
//! ```
//!
//! # Environment Variables
//!
//! - `GATEWAY_HOST`, `GATEWAY_PORT`: listen address
//! - `GATEWAY_MODEL`: model name sent upstream
//! - `GATEWAY_SYSTEM_PROMPT`: optional system prompt
//! - `GATEWAY_READ_TIMEOUT`: seconds the upstream may stay silent between chunks
//! - `OLLAMA_URL`: full upstream base URL
//! - `OLLAMA_HOST`, `OLLAMA_PORT`: upstream host/port (ignored when `OLLAMA_URL` is set)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default upstream model
pub const DEFAULT_MODEL: &str = "tinyllama";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Tracks where the effective configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Structures
// =============================================================================

/// `[server]` section of the TOML file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerToml {
    /// Listen host
    pub host: Option<String>,
    /// Listen port
    pub port: Option<u16>,
    /// Queued inbound messages per socket session
    pub session_queue_capacity: Option<usize>,
    /// Queued outbound events per socket session
    pub outbound_capacity: Option<usize>,
}

/// `[upstream]` section of the TOML file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamToml {
    /// Backend base URL
    pub base_url: Option<String>,
    /// Model name
    pub model: Option<String>,
    /// System prompt
    pub system_prompt: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Connect timeout in seconds
    pub connect_timeout_secs: Option<u64>,
    /// Idle timeout between body reads, in seconds
    pub read_timeout_secs: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayToml {
    /// Server section
    pub server: ServerToml,
    /// Upstream section
    pub upstream: UpstreamToml,
}

// =============================================================================
// Effective Configuration
// =============================================================================

/// Listener and per-session settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Queued inbound messages per socket session
    pub session_queue_capacity: usize,
    /// Queued outbound events per socket session
    pub outbound_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            session_queue_capacity: 16,
            outbound_capacity: 32,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Generation backend settings
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamConfig {
    /// Base URL, without the `/api/...` path
    pub base_url: String,
    /// Model name sent with every request
    pub model: String,
    /// Optional system prompt
    pub system_prompt: Option<String>,
    /// Optional sampling temperature
    pub temperature: Option<f32>,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Longest silence tolerated between two reads of the response body
    ///
    /// A stream that keeps producing chunks is never cut off.
    pub read_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            temperature: None,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(120),
        }
    }
}

/// Centralized gateway configuration
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Server settings
    pub server: ServerConfig,
    /// Upstream settings
    pub upstream: UpstreamConfig,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
    source: ConfigSource,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl GatewayConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check values that would make the gateway unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "upstream model must not be empty".to_string(),
            ));
        }
        let url = self.upstream.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "upstream base_url must be an http(s) URL, got {url:?}"
            )));
        }
        if self.server.session_queue_capacity == 0 || self.server.outbound_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "session queue capacities must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("chat-gateway").join("gateway.toml"))
}

/// Load configuration from the default path and the process environment
pub fn load_config() -> Result<GatewayConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from `path` (if it exists) and the process environment
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<GatewayConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
///
/// A missing file is not an error; defaults are used instead.
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = GatewayConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_config = read_toml(config_path)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);

    Ok(config)
}

fn read_toml(path: &Path) -> Result<GatewayToml, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(toml::from_str(&content)?)
}

fn apply_toml_config(config: &mut GatewayConfig, toml: &GatewayToml) {
    let server = &toml.server;
    if let Some(ref host) = server.host {
        config.server.host = host.clone();
    }
    if let Some(port) = server.port {
        config.server.port = port;
    }
    if let Some(capacity) = server.session_queue_capacity {
        config.server.session_queue_capacity = capacity;
    }
    if let Some(capacity) = server.outbound_capacity {
        config.server.outbound_capacity = capacity;
    }

    let upstream = &toml.upstream;
    if let Some(ref url) = upstream.base_url {
        config.upstream.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(ref model) = upstream.model {
        config.upstream.model = model.clone();
    }
    if upstream.system_prompt.is_some() {
        config.upstream.system_prompt = upstream.system_prompt.clone();
    }
    if upstream.temperature.is_some() {
        config.upstream.temperature = upstream.temperature;
    }
    if let Some(secs) = upstream.connect_timeout_secs {
        config.upstream.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = upstream.read_timeout_secs {
        config.upstream.read_timeout = Duration::from_secs(secs);
    }
}

fn apply_env_config<F>(config: &mut GatewayConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = env("GATEWAY_HOST") {
        config.server.host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env("GATEWAY_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = port;
        config.source = ConfigSource::Env;
    }
    if let Some(model) = env("GATEWAY_MODEL") {
        config.upstream.model = model;
        config.source = ConfigSource::Env;
    }
    if let Some(prompt) = env("GATEWAY_SYSTEM_PROMPT") {
        config.upstream.system_prompt = Some(prompt);
        config.source = ConfigSource::Env;
    }
    if let Some(secs) = env("GATEWAY_READ_TIMEOUT").and_then(|v| v.parse().ok()) {
        config.upstream.read_timeout = Duration::from_secs(secs);
        config.source = ConfigSource::Env;
    }

    if let Some(url) = env("OLLAMA_URL") {
        config.upstream.base_url = url.trim_end_matches('/').to_string();
        config.source = ConfigSource::Env;
    } else {
        let host = env("OLLAMA_HOST");
        let port = env("OLLAMA_PORT");
        if host.is_some() || port.is_some() {
            let host = host.unwrap_or_else(|| "localhost".to_string());
            let port: u16 = port.and_then(|p| p.parse().ok()).unwrap_or(11434);
            config.upstream.base_url = format!("http://{host}:{port}");
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Listen host override
    pub host: Option<String>,
    /// Listen port override
    pub port: Option<u16>,
    /// Upstream base URL override
    pub upstream_url: Option<String>,
    /// Model override
    pub model: Option<String>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set host override
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set port override
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set upstream URL override
    #[must_use]
    pub fn with_upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = Some(url.into());
        self
    }

    /// Set model override
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.port.is_none()
            && self.upstream_url.is_none()
            && self.model.is_none()
    }

    /// Apply overrides to the configuration
    pub fn apply(&self, config: &mut GatewayConfig) {
        if self.is_empty() {
            return;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref url) = self.upstream_url {
            config.upstream.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ref model) = self.model {
            config.upstream.model = model.clone();
        }
        config.source = ConfigSource::Cli;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();

        assert_eq!(config.server.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.upstream.base_url, "http://localhost:11434");
        assert_eq!(config.upstream.model, "tinyllama");
        assert_eq!(config.upstream.read_timeout, Duration::from_secs(120));
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.ends_with("chat-gateway/gateway.toml"));
        }
    }

    #[test]
    fn test_parse_valid_toml() {
        let file = write_toml(
            r#"
[server]
host = "127.0.0.1"
port = 9000
session_queue_capacity = 4

[upstream]
base_url = "http://ollama:11434/"
model = "llama3.2"
system_prompt = "Be brief."
temperature = 0.2
read_timeout_secs = 30
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.server.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.server.session_queue_capacity, 4);
        assert_eq!(config.server.outbound_capacity, 32);
        assert_eq!(config.upstream.base_url, "http://ollama:11434");
        assert_eq!(config.upstream.model, "llama3.2");
        assert_eq!(config.upstream.system_prompt.as_deref(), Some("Be brief."));
        assert_eq!(config.upstream.temperature, Some(0.2));
        assert_eq!(config.upstream.read_timeout, Duration::from_secs(30));
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_empty_toml_keeps_defaults() {
        let file = write_toml("");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.upstream, UpstreamConfig::default());
    }

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/chat-gateway/gateway.toml");
        let config = load_config_with_env(Some(path), no_env).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = write_toml("[server\nport = \"not a number\"\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_toml(
            r#"
[server]
port = 9000

[upstream]
model = "file-model"
"#,
        );
        let env = env_from(&[("GATEWAY_MODEL", "env-model"), ("GATEWAY_PORT", "7000")]);

        let config = load_config_with_env(Some(file.path().to_path_buf()), env).unwrap();

        assert_eq!(config.upstream.model, "env-model");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_unparseable_env_values_are_ignored() {
        let env = env_from(&[("GATEWAY_PORT", "eighty"), ("GATEWAY_READ_TIMEOUT", "-1")]);
        let config = load_config_with_env(None, env).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.upstream.read_timeout, Duration::from_secs(120));
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_ollama_url_wins_over_host_and_port() {
        let env = env_from(&[
            ("OLLAMA_URL", "http://gpu-box:11434/"),
            ("OLLAMA_HOST", "ignored"),
        ]);
        let config = load_config_with_env(None, env).unwrap();
        assert_eq!(config.upstream.base_url, "http://gpu-box:11434");
    }

    #[test]
    fn test_ollama_host_without_port() {
        let env = env_from(&[("OLLAMA_HOST", "ollama")]);
        let config = load_config_with_env(None, env).unwrap();
        assert_eq!(config.upstream.base_url, "http://ollama:11434");
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = env_from(&[("GATEWAY_MODEL", "env-model")]);
        let mut config = load_config_with_env(None, env).unwrap();

        ConfigOverrides::new()
            .with_model("cli-model")
            .with_port(8080)
            .apply(&mut config);

        assert_eq!(config.upstream.model, "cli-model");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_no_change() {
        let mut config = GatewayConfig::default();
        let overrides = ConfigOverrides::new();
        assert!(overrides.is_empty());
        overrides.apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = GatewayConfig::default();
        config.upstream.model = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = GatewayConfig::default();
        config.upstream.base_url = "ollama:11434".to_string();
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.server.session_queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}
