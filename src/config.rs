//! Ambient client configuration: timeouts, transport behavior, and the
//! bounded nonce-retry budget. Certificate storage, renewal scheduling,
//! and challenge provisioning are the caller's responsibility and have
//! no representation here.

use crate::error::{AcmeError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Tunables for the underlying HTTP transport and the signed-request loop.
/// Buildable programmatically via the `with_*` methods, or loaded from a
/// TOML file with [`ClientSettings::from_file`] and layered with
/// environment overrides via [`ClientSettings::apply_env_overrides`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// TCP connect timeout, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-request read timeout, in seconds.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// `Accept-Language` sent with every request, mainly so problem
    /// documents come back in the caller's preferred language.
    #[serde(default)]
    pub accept_language: Option<String>,

    /// Whether to request gzip-compressed responses.
    #[serde(default = "default_gzip")]
    pub gzip: bool,

    /// Maximum number of `badNonce` retries for a single logical request
    /// before giving up and returning the error to the caller.
    #[serde(default = "default_nonce_retry_budget")]
    pub nonce_retry_budget: u32,

    /// User-Agent string sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_gzip() -> bool {
    true
}

fn default_nonce_retry_budget() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("acme-core/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            accept_language: None,
            gzip: default_gzip(),
            nonce_retry_budget: default_nonce_retry_budget(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AcmeError::configuration(format!("failed to read config file: {e}")))?;
        Self::from_str(&content)
    }

    /// Parse settings from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AcmeError::configuration(format!("failed to parse TOML: {e}")))
    }

    /// Layer environment variable overrides on top of whatever was loaded
    /// from file or built programmatically. Unset variables leave the
    /// existing value untouched.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(secs) = env::var("ACME_CORE_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = secs
                .parse()
                .map_err(|_| AcmeError::configuration("ACME_CORE_CONNECT_TIMEOUT_SECS must be an integer"))?;
        }

        if let Ok(secs) = env::var("ACME_CORE_READ_TIMEOUT_SECS") {
            self.read_timeout_secs = secs
                .parse()
                .map_err(|_| AcmeError::configuration("ACME_CORE_READ_TIMEOUT_SECS must be an integer"))?;
        }

        if let Ok(language) = env::var("ACME_CORE_ACCEPT_LANGUAGE") {
            self.accept_language = Some(language);
        }

        if let Ok(gzip) = env::var("ACME_CORE_GZIP") {
            self.gzip = gzip
                .parse()
                .map_err(|_| AcmeError::configuration("ACME_CORE_GZIP must be \"true\" or \"false\""))?;
        }

        if let Ok(budget) = env::var("ACME_CORE_NONCE_RETRY_BUDGET") {
            self.nonce_retry_budget = budget
                .parse()
                .map_err(|_| AcmeError::configuration("ACME_CORE_NONCE_RETRY_BUDGET must be an integer"))?;
        }

        if let Ok(user_agent) = env::var("ACME_CORE_USER_AGENT") {
            self.user_agent = user_agent;
        }

        Ok(())
    }

    /// Reject settings that would make every request fail outright.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(AcmeError::configuration("connect timeout must be greater than zero"));
        }
        if self.read_timeout_secs == 0 {
            return Err(AcmeError::configuration("read timeout must be greater than zero"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(AcmeError::configuration("user agent must not be empty"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_accept_language(mut self, language: impl Into<String>) -> Self {
        self.accept_language = Some(language.into());
        self
    }

    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    pub fn with_nonce_retry_budget(mut self, budget: u32) -> Self {
        self.nonce_retry_budget = budget;
        self
    }

    /// Build the `reqwest::Client` these settings describe.
    pub fn build_http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout())
            .timeout(self.read_timeout())
            .user_agent(&self.user_agent)
            .gzip(self.gzip);

        if let Some(language) = &self.accept_language {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                reqwest::header::ACCEPT_LANGUAGE,
                reqwest::header::HeaderValue::from_str(language)
                    .map_err(|e| AcmeError::configuration(format!("invalid accept-language: {e}")))?,
            );
            builder = builder.default_headers(headers);
        }

        builder
            .build()
            .map_err(|e| AcmeError::configuration(format!("failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_documented_values() {
        let settings = ClientSettings::default();
        assert_eq!(settings.connect_timeout(), Duration::from_secs(30));
        assert_eq!(settings.read_timeout(), Duration::from_secs(30));
        assert_eq!(settings.nonce_retry_budget, 10);
        assert!(settings.gzip);
    }

    #[test]
    fn builder_methods_override_defaults() {
        let settings = ClientSettings::new()
            .with_nonce_retry_budget(3)
            .with_gzip(false)
            .with_accept_language("en-US");
        assert_eq!(settings.nonce_retry_budget, 3);
        assert!(!settings.gzip);
        assert_eq!(settings.accept_language.as_deref(), Some("en-US"));
    }

    #[test]
    fn builds_an_http_client() {
        let settings = ClientSettings::default();
        assert!(settings.build_http_client().is_ok());
    }

    #[test]
    fn parses_partial_toml_with_defaults_filled_in() {
        let settings = ClientSettings::from_str("gzip = false\nnonce_retry_budget = 5\n").unwrap();
        assert!(!settings.gzip);
        assert_eq!(settings.nonce_retry_budget, 5);
        assert_eq!(settings.connect_timeout_secs, 30);
        assert_eq!(settings.user_agent, default_user_agent());
    }

    #[test]
    fn env_overrides_apply_on_top_of_defaults() {
        // SAFETY: test-only, no other test reads ACME_CORE_NONCE_RETRY_BUDGET concurrently.
        unsafe {
            env::set_var("ACME_CORE_NONCE_RETRY_BUDGET", "7");
        }
        let mut settings = ClientSettings::default();
        settings.apply_env_overrides().unwrap();
        unsafe {
            env::remove_var("ACME_CORE_NONCE_RETRY_BUDGET");
        }
        assert_eq!(settings.nonce_retry_budget, 7);
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let settings = ClientSettings::new().with_connect_timeout(Duration::ZERO);
        assert!(settings.validate().is_err());
    }
}
