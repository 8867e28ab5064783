//! Configuration module for environment variable parsing.
//!
//! Every setting has a default so the guard can start without any
//! environment at all. An empty auth token means signed requests are
//! rejected outside debug mode.

use std::env;
use tracing::warn;

/// Default Twilio REST API version.
pub const DEFAULT_API_VERSION: &str = "2010-04-01";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Twilio account SID
    pub account_sid: String,

    /// Twilio auth token, the shared secret used for request signatures
    pub auth_token: String,

    /// Twilio REST API version
    pub api_version: String,

    /// Debug mode skips signature verification entirely
    pub debug: bool,

    // =========================================================================
    // Web Server Configuration
    // =========================================================================

    /// Port for the web server to listen on
    pub port: u16,

    /// Connection URL for the caller blacklist database
    pub database_url: String,

    /// Externally visible base URL (scheme + host) that Twilio calls.
    /// Overrides the `Host` / `X-Forwarded-Proto` reconstruction when set.
    pub public_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            account_sid: String::new(),
            auth_token: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            debug: false,
            port: 8080,
            database_url: "sqlite://twilio_guard.db?mode=rwc".to_string(),
            public_base_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or(defaults.account_sid),

            auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or(defaults.auth_token),

            api_version: env::var("TWILIO_API_VERSION")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.api_version),

            debug: parse_flag("DEBUG", defaults.debug),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),

            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),

            public_base_url: env::var("PUBLIC_BASE_URL")
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
        }
    }

    /// Twilio REST resource URI for the configured account.
    pub fn account_uri(&self) -> String {
        format!(
            "https://api.twilio.com/{}/Accounts/{}",
            self.api_version, self.account_sid
        )
    }

    /// Whether request signatures can be verified at all.
    pub fn has_auth_token(&self) -> bool {
        !self.auth_token.trim().is_empty()
    }
}

/// Parse a boolean flag like "1", "true" or "yes".
fn parse_flag(name: &str, default: bool) -> bool {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" | "" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid flag value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_values() {
        env::set_var("TEST_FLAG_TRUE", "True");
        env::set_var("TEST_FLAG_OFF", "0");
        env::set_var("TEST_FLAG_BAD", "maybe");
        assert!(parse_flag("TEST_FLAG_TRUE", false));
        assert!(!parse_flag("TEST_FLAG_OFF", true));
        assert!(parse_flag("TEST_FLAG_BAD", true));
        env::remove_var("TEST_FLAG_TRUE");
        env::remove_var("TEST_FLAG_OFF");
        env::remove_var("TEST_FLAG_BAD");
    }

    #[test]
    fn test_parse_flag_default() {
        assert!(!parse_flag("NONEXISTENT_FLAG", false));
    }

    #[test]
    fn test_default_api_version() {
        let config = Config::default();
        assert_eq!(config.api_version, "2010-04-01");
        assert!(!config.has_auth_token());
    }

    #[test]
    fn test_account_uri_contains_version_and_sid() {
        let config = Config {
            account_sid: "AC123".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.account_uri(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123"
        );
    }
}
