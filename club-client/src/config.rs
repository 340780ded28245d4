//! Client configuration

use std::time::Duration;

use shared::request::{APP_DATA_PATH, MUTATE_PATH};

/// Known default admin PIN, also the push credential fallback
pub const DEFAULT_ADMIN_PIN: &str = "190894";

/// Client configuration for the club document service
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "https://club.example.org")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Canonical document resource path
    pub app_data_path: String,

    /// Cooperative mutation endpoint path
    pub mutate_path: String,

    /// Debounce window for full-document pushes
    pub push_debounce: Duration,

    /// Background poll period (paused while backgrounded)
    pub poll_interval: Duration,

    /// Delay before a failed push is tried again
    pub push_retry: Duration,

    /// PIN seeded on first run and used by the push fallback
    pub admin_pin: String,

    /// Push with the default PIN when an admin session is active but no
    /// credential is cached
    pub credential_fallback: bool,
}

impl ClientConfig {
    /// Create a new configuration with the default endpoints and timings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: 30,
            app_data_path: APP_DATA_PATH.to_string(),
            mutate_path: MUTATE_PATH.to_string(),
            push_debounce: Duration::from_millis(350),
            poll_interval: Duration::from_secs(15),
            push_retry: Duration::from_secs(5),
            admin_pin: DEFAULT_ADMIN_PIN.to_string(),
            credential_fallback: true,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_app_data_path(mut self, path: impl Into<String>) -> Self {
        self.app_data_path = path.into();
        self
    }

    pub fn with_mutate_path(mut self, path: impl Into<String>) -> Self {
        self.mutate_path = path.into();
        self
    }

    /// Set the push debounce window
    pub fn with_push_debounce(mut self, debounce: Duration) -> Self {
        self.push_debounce = debounce;
        self
    }

    /// Set the background poll period
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_push_retry(mut self, delay: Duration) -> Self {
        self.push_retry = delay;
        self
    }

    pub fn with_admin_pin(mut self, pin: impl Into<String>) -> Self {
        self.admin_pin = pin.into();
        self
    }

    /// Enable or disable the default-PIN push fallback
    pub fn with_credential_fallback(mut self, enabled: bool) -> Self {
        self.credential_fallback = enabled;
        self
    }

    /// Full URL for a path on the configured server
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8888")
    }
}
