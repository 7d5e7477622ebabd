//! Centralized configuration for Shopscout.
//!
//! All tunable parameters and credentials are defined here and built once at
//! process start. Components receive the section they need instead of reading
//! the environment themselves.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

/// Secret used to sign tokens when `JWT_SECRET` is not provided.
pub const DEFAULT_JWT_SECRET: &str = "dev_secret";

/// Central configuration for all Shopscout components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct ShopscoutConfig {
    pub server: ServerConfig,
    pub sources: SourcesConfig,
    pub auth: AuthConfig,
}

/// HTTP listener and on-disk locations.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Directory holding the single-page frontend
    pub static_dir: PathBuf,
    /// JSON file holding registered users
    pub users_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: PathBuf::from("public"),
            users_file: PathBuf::from("data").join("users.json"),
        }
    }
}

impl ServerConfig {
    /// Address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Credentials and endpoints for every upstream product source.
///
/// Each source is independently optional; a missing credential disables
/// only that source.
#[derive(Debug, Clone, Default)]
pub struct SourcesConfig {
    pub serpapi: SerpApiConfig,
    pub flipkart: FlipkartConfig,
    pub apify: ApifyConfig,
}

/// Generic shopping search (SerpApi, Google Shopping engine).
#[derive(Debug, Clone)]
pub struct SerpApiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub result_count: u32,
    pub timeout: Duration,
}

impl Default for SerpApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://serpapi.com".to_string(),
            result_count: 10,
            timeout: Duration::from_secs(15),
        }
    }
}

impl SerpApiConfig {
    /// Whether the credential needed to call this source is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Affiliate product search (Flipkart affiliate API).
#[derive(Debug, Clone)]
pub struct FlipkartConfig {
    pub affiliate_id: Option<String>,
    pub affiliate_token: Option<String>,
    pub base_url: String,
    pub result_count: u32,
    pub timeout: Duration,
}

impl Default for FlipkartConfig {
    fn default() -> Self {
        Self {
            affiliate_id: None,
            affiliate_token: None,
            base_url: "https://affiliate-api.flipkart.net".to_string(),
            result_count: 10,
            timeout: Duration::from_secs(10),
        }
    }
}

impl FlipkartConfig {
    /// Both the affiliate id and token are required.
    pub fn is_configured(&self) -> bool {
        self.affiliate_id.is_some() && self.affiliate_token.is_some()
    }
}

/// Asynchronous scraper run (Apify actor scraping Ajio).
#[derive(Debug, Clone)]
pub struct ApifyConfig {
    pub token: Option<String>,
    pub base_url: String,
    pub actor_id: String,
    /// Timeout for the request that starts the run
    pub start_timeout: Duration,
    /// Timeout for each status poll and the dataset fetch
    pub poll_timeout: Duration,
    /// Delay before each status poll
    pub poll_interval: Duration,
    /// Number of polls before the run is considered timed out
    pub max_polls: u32,
}

impl Default for ApifyConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: "https://api.apify.com".to_string(),
            actor_id: "easyapi~ajio-product-scraper".to_string(),
            start_timeout: Duration::from_secs(15),
            poll_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(1500),
            max_polls: 20,
        }
    }
}

impl ApifyConfig {
    /// Whether the platform token is present.
    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

/// Token signing and password hashing parameters.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// bcrypt cost factor
    pub bcrypt_cost: u32,
    /// Gate `/api/search` behind the bearer-token middleware
    pub search_requires_auth: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            bcrypt_cost: 10,
            search_requires_auth: false,
        }
    }
}

impl AuthConfig {
    /// True when tokens are signed with the built-in development secret.
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

/// Errors raised while validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

impl ShopscoutConfig {
    /// Creates configuration from the process environment.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as absent. Values that fail to parse keep
    /// the default and are reported at warn level.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        // Credentials are used byte for byte; only blank values count as absent.
        let secret = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();

        // Server
        if let Some(host) = get("HOST") {
            config.server.host = host;
        }
        if let Some(port) = parse_or_warn::<u16>("PORT", get("PORT")) {
            config.server.port = port;
        }
        if let Some(dir) = get("SHOPSCOUT_STATIC_DIR") {
            config.server.static_dir = PathBuf::from(dir);
        }
        if let Some(file) = get("SHOPSCOUT_USERS_FILE") {
            config.server.users_file = PathBuf::from(file);
        }

        // Sources
        config.sources.serpapi.api_key = secret("SERPAPI_KEY");
        if let Some(base_url) = get("SERPAPI_BASE_URL") {
            config.sources.serpapi.base_url = base_url;
        }

        config.sources.flipkart.affiliate_id = secret("FLIPKART_AFFILIATE_ID");
        config.sources.flipkart.affiliate_token = secret("FLIPKART_AFFILIATE_TOKEN");
        if let Some(base_url) = get("FLIPKART_BASE_URL") {
            config.sources.flipkart.base_url = base_url;
        }

        config.sources.apify.token = secret("APIFY_TOKEN");
        if let Some(actor_id) = get("APIFY_ACTOR_ID") {
            config.sources.apify.actor_id = actor_id;
        }
        if let Some(base_url) = get("APIFY_BASE_URL") {
            config.sources.apify.base_url = base_url;
        }

        // Auth
        if let Some(jwt_secret) = secret("JWT_SECRET") {
            config.auth.jwt_secret = jwt_secret;
        }
        if let Some(gated) = parse_or_warn::<bool>(
            "SHOPSCOUT_SEARCH_REQUIRES_AUTH",
            get("SHOPSCOUT_SEARCH_REQUIRES_AUTH"),
        ) {
            config.auth.search_requires_auth = gated;
        }

        config
    }

    /// Checks values that would otherwise fail later at runtime.
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` - Port is zero, a base URL does not parse,
    ///   polling is disabled, or the bcrypt cost is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PORT",
                reason: "port must be non-zero".to_string(),
            });
        }

        for (key, base_url) in [
            ("SERPAPI_BASE_URL", &self.sources.serpapi.base_url),
            ("FLIPKART_BASE_URL", &self.sources.flipkart.base_url),
            ("APIFY_BASE_URL", &self.sources.apify.base_url),
        ] {
            Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
                key,
                reason: e.to_string(),
            })?;
        }

        if self.sources.apify.max_polls == 0 || self.sources.apify.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "APIFY_POLLING",
                reason: "poll interval and poll count must be non-zero".to_string(),
            });
        }

        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                key: "BCRYPT_COST",
                reason: format!("cost {} outside 4..=31", self.auth.bcrypt_cost),
            });
        }

        Ok(())
    }

    /// Names of the sources whose credentials are present.
    pub fn enabled_sources(&self) -> Vec<&'static str> {
        let mut enabled = Vec::new();
        if self.sources.flipkart.is_configured() {
            enabled.push("flipkart");
        }
        if self.sources.apify.is_configured() {
            enabled.push("ajio");
        }
        if self.sources.serpapi.is_configured() {
            enabled.push("serpapi");
        }
        enabled
    }
}

fn parse_or_warn<T: FromStr>(key: &str, value: Option<String>) -> Option<T> {
    let value = value?;
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "Ignoring unparsable configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> ShopscoutConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ShopscoutConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_disable_every_source() {
        let config = config_from(&[]);

        assert!(!config.sources.serpapi.is_configured());
        assert!(!config.sources.flipkart.is_configured());
        assert!(!config.sources.apify.is_configured());
        assert!(config.enabled_sources().is_empty());
        assert_eq!(config.server.port, 3000);
        assert!(config.auth.uses_default_secret());
        assert!(!config.auth.search_requires_auth);
    }

    #[test]
    fn test_fixed_defaults() {
        let config = ShopscoutConfig::default();

        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.auth.token_ttl, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(config.auth.jwt_secret, "dev_secret");

        let apify = &config.sources.apify;
        assert_eq!(apify.poll_interval, Duration::from_millis(1500));
        assert_eq!(apify.max_polls, 20);
        assert_eq!(apify.start_timeout, Duration::from_secs(15));
        assert_eq!(apify.poll_timeout, Duration::from_secs(10));

        assert_eq!(config.sources.serpapi.timeout, Duration::from_secs(15));
        assert_eq!(config.sources.serpapi.result_count, 10);
        assert_eq!(config.sources.flipkart.timeout, Duration::from_secs(10));
        assert_eq!(config.sources.flipkart.result_count, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_credentials_keep_surrounding_whitespace() {
        let config = config_from(&[
            ("JWT_SECRET", " padded secret "),
            ("SERPAPI_KEY", "key\t"),
            ("APIFY_TOKEN", " tok"),
            ("PORT", " 8080 "),
        ]);

        assert_eq!(config.auth.jwt_secret, " padded secret ");
        assert_eq!(config.sources.serpapi.api_key.as_deref(), Some("key\t"));
        assert_eq!(config.sources.apify.token.as_deref(), Some(" tok"));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_flipkart_needs_both_credentials() {
        let config = config_from(&[("FLIPKART_AFFILIATE_ID", "aff")]);
        assert!(!config.sources.flipkart.is_configured());

        let config = config_from(&[
            ("FLIPKART_AFFILIATE_ID", "aff"),
            ("FLIPKART_AFFILIATE_TOKEN", "tok"),
        ]);
        assert!(config.sources.flipkart.is_configured());
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        let config = config_from(&[("SERPAPI_KEY", "  "), ("JWT_SECRET", "")]);

        assert!(config.sources.serpapi.api_key.is_none());
        assert!(config.auth.uses_default_secret());
    }

    #[test]
    fn test_enabled_sources_follow_precedence_order() {
        let config = config_from(&[
            ("SERPAPI_KEY", "k"),
            ("APIFY_TOKEN", "t"),
            ("FLIPKART_AFFILIATE_ID", "aff"),
            ("FLIPKART_AFFILIATE_TOKEN", "tok"),
        ]);

        assert_eq!(config.enabled_sources(), vec!["flipkart", "ajio", "serpapi"]);
    }

    #[test]
    fn test_unparsable_values_keep_defaults() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("SHOPSCOUT_SEARCH_REQUIRES_AUTH", "maybe"),
        ]);

        assert_eq!(config.server.port, 3000);
        assert!(!config.auth.search_requires_auth);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("HOST", "0.0.0.0"),
            ("JWT_SECRET", "s3cret"),
            ("SHOPSCOUT_SEARCH_REQUIRES_AUTH", "true"),
            ("APIFY_ACTOR_ID", "someone~scraper"),
            ("SHOPSCOUT_USERS_FILE", "/tmp/users.json"),
        ]);

        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert!(config.auth.search_requires_auth);
        assert_eq!(config.sources.apify.actor_id, "someone~scraper");
        assert_eq!(config.server.users_file, PathBuf::from("/tmp/users.json"));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let config = config_from(&[("SERPAPI_BASE_URL", "not a url")]);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SERPAPI_BASE_URL"));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(ShopscoutConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_polls() {
        let mut config = ShopscoutConfig::default();
        config.sources.apify.max_polls = 0;

        assert!(config.validate().is_err());
    }
}
