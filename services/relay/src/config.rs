use secrecy::SecretString;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup. The
/// upstream credential never leaves this process; connecting clients only
/// ever see the advertised relay address.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub upstream_url: String,
    pub upstream_api_key: SecretString,
    pub model: String,
    pub advertised_url: String,
    pub queue_depth: usize,
    pub token_ttl_secs: u64,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `BIND_ADDRESS`: The address and port to bind the server to (e.g., "0.0.0.0:3000").
    /// *   `UPSTREAM_URL`: Base URL of the upstream speech endpoint.
    /// *   `UPSTREAM_API_KEY`: The upstream credential. Required.
    /// *   `UPSTREAM_MODEL`: (Optional) The realtime model to bind sessions to.
    /// *   `ADVERTISED_URL`: (Optional) The relay address handed out in session grants.
    /// *   `RELAY_QUEUE_DEPTH`: (Optional) Bounded per-direction message queue depth.
    /// *   `TOKEN_TTL_SECS`: (Optional) Lifetime of issued session grants.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let upstream_url =
            std::env::var("UPSTREAM_URL").unwrap_or_else(|_| "wss://api.openai.com/v1".to_string());

        let upstream_api_key = std::env::var("UPSTREAM_API_KEY")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingVar("UPSTREAM_API_KEY".to_string()))?;

        let model = std::env::var("UPSTREAM_MODEL")
            .unwrap_or_else(|_| "gpt-4o-realtime-preview-2024-10-01".to_string());

        let advertised_url = std::env::var("ADVERTISED_URL")
            .unwrap_or_else(|_| format!("ws://{}", bind_address_str));

        let queue_depth = match std::env::var("RELAY_QUEUE_DEPTH") {
            Ok(raw) => raw.parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("RELAY_QUEUE_DEPTH".to_string(), e.to_string())
            })?,
            Err(_) => 64,
        };

        let token_ttl_secs = match std::env::var("TOKEN_TTL_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("TOKEN_TTL_SECS".to_string(), e.to_string())
            })?,
            Err(_) => 3600,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            upstream_url,
            upstream_api_key,
            model,
            advertised_url,
            queue_depth,
            token_ttl_secs,
            log_level,
        })
    }
}
