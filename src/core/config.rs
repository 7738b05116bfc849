use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

/// Default tolerance, in milliseconds, between a signed request's timestamp
/// and the exchange's clock
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

/// Default REST request timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub testnet: bool,
    pub base_url: Option<String>,
    pub ws_url: Option<String>,
    pub recv_window_ms: u64,
    pub timeout_seconds: u64,
}

// Secrets are never serialized
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 7)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("testnet", &self.testnet)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("ws_url", &self.ws_url)?;
        state.serialize_field("recv_window_ms", &self.recv_window_ms)?;
        state.serialize_field("timeout_seconds", &self.timeout_seconds)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            api_key: String,
            secret_key: String,
            #[serde(default)]
            testnet: bool,
            base_url: Option<String>,
            ws_url: Option<String>,
            recv_window_ms: Option<u64>,
            timeout_seconds: Option<u64>,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            testnet: helper.testnet,
            base_url: helper.base_url,
            ws_url: helper.ws_url,
            recv_window_ms: helper.recv_window_ms.unwrap_or(DEFAULT_RECV_WINDOW_MS),
            timeout_seconds: helper.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        })
    }
}

impl ExchangeConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            testnet: false,
            base_url: None,
            ws_url: None,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{EXCHANGE}_API_KEY` (e.g., `BYBIT_API_KEY`)
    /// - `{EXCHANGE}_SECRET_KEY` (e.g., `BYBIT_SECRET_KEY`)
    /// - `{EXCHANGE}_TESTNET` (optional, defaults to false)
    /// - `{EXCHANGE}_BASE_URL` (optional)
    /// - `{EXCHANGE}_WS_URL` (optional)
    /// - `{EXCHANGE}_RECV_WINDOW` (optional, milliseconds)
    pub fn from_env(exchange_prefix: &str) -> Result<Self, ConfigError> {
        let prefix = exchange_prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;
        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let testnet = match env::var(format!("{}_TESTNET", prefix)) {
            Ok(raw) => raw.parse::<bool>().map_err(|_| {
                ConfigError::InvalidConfiguration(format!(
                    "{}_TESTNET must be true or false, got '{}'",
                    prefix, raw
                ))
            })?,
            Err(_) => false,
        };

        let recv_window_ms = match env::var(format!("{}_RECV_WINDOW", prefix)) {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                ConfigError::InvalidConfiguration(format!(
                    "{}_RECV_WINDOW must be a number of milliseconds, got '{}'",
                    prefix, raw
                ))
            })?,
            Err(_) => DEFAULT_RECV_WINDOW_MS,
        };

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            testnet,
            base_url: env::var(format!("{}_BASE_URL", prefix)).ok(),
            ws_url: env::var(format!("{}_WS_URL", prefix)).ok(),
            recv_window_ms,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        })
    }

    /// Load a `.env` file (if present) and then read the configuration from
    /// the environment.
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(exchange_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(exchange_prefix, ".env")
    }

    /// Same as [`ExchangeConfig::from_env_file`] with a custom path, e.g.
    /// `.env.testnet`
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(
        exchange_prefix: &str,
        env_file_path: &str,
    ) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            // A missing file is fine, the process environment still applies
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(exchange_prefix)
    }

    /// Configuration for public endpoints only
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Check if this configuration has valid credentials for authenticated operations
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    #[must_use]
    pub const fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub fn ws_url(mut self, ws_url: String) -> Self {
        self.ws_url = Some(ws_url);
        self
    }

    #[must_use]
    pub const fn recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Pick the configured override, or the production/testnet default
    pub fn resolve_base_url(&self, production: &str, testnet: &str) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            if self.testnet {
                testnet.to_string()
            } else {
                production.to_string()
            }
        })
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
