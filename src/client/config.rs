use crate::client::consts::{DEFAULT_RELAY_URL, RELAY_URL_ENV};

/// Connection settings for the relay. Carries no upstream credential, only
/// the relay address and a locally generated opaque session identifier.
pub struct Config {
    relay_url: String,
    session_id: String,
}

pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_relay_url(mut self, relay_url: &str) -> Self {
        self.config.relay_url = relay_url.to_string();
        self
    }

    pub fn with_session_id(mut self, session_id: &str) -> Self {
        self.config.session_id = session_id.to_string();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            relay_url: std::env::var(RELAY_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string()),
            session_id: generate_session_id(),
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Opaque local identifier; carries no meaning beyond correlating logs
/// between the client and the relay.
fn generate_session_id() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64 | (d.as_secs() << 32))
        .unwrap_or_default();
    format!("sess_{:016x}", nanos)
}
