use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000";

/// Upstream image provider settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Relay server settings. The provider key is read once at startup and acts
/// as the default credential for requests that do not carry their own.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub provider: ProviderConfig,
    pub log_level: Option<String>,
    pub log_json: bool,
}

/// Client-side settings: where the relay lives and where local state is kept.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub relay_url: String,
    pub store_dir: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            api_key: None,
            base_url: None,
            model: None,
            timeout_secs: None,
        }
    }
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        let base_url = env::var("OPENAI_BASE_URL").ok();
        let model = env::var("OPENAI_IMAGE_MODEL").ok();
        let timeout_secs = env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok());

        ProviderConfig {
            api_key,
            base_url,
            model,
            timeout_secs,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: None,
            port: None,
            provider: ProviderConfig::default(),
            log_level: None,
            log_json: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let host = env::var("HOST").ok();
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let log_level = env::var("LOG_LEVEL").ok();
        let log_json = env::var("LOG_JSON").ok().map_or(false, |val| val == "true");

        Config {
            host,
            port,
            provider: ProviderConfig::from_env(),
            log_level,
            log_json,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.provider.api_key = Some(api_key.into());
        self
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn default_api_key(&self) -> Option<&str> {
        self.provider.api_key.as_deref()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            store_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let relay_url = env::var("STYLEGEN_RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.into());
        let store_dir = env::var("STYLEGEN_STORE_DIR").ok().map(PathBuf::from);

        ClientConfig {
            relay_url,
            store_dir,
        }
    }

    pub fn with_relay_url(mut self, relay_url: impl Into<String>) -> Self {
        self.relay_url = relay_url.into();
        self
    }

    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.host(), DEFAULT_HOST);
        assert_eq!(config.provider.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.provider.model(), DEFAULT_IMAGE_MODEL);
        assert!(config.default_api_key().is_none());
    }

    #[test]
    fn test_builders() {
        let config = Config::new()
            .with_port(8080)
            .with_api_key("sk-test")
            .with_provider(ProviderConfig::new().with_api_key("sk-other").with_model("gpt-image-1"));
        assert_eq!(config.port(), 8080);
        assert_eq!(config.default_api_key(), Some("sk-other"));
        assert_eq!(config.provider.model(), "gpt-image-1");
    }
}
