//! Web server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the web server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Host to bind the server to
    pub host: String,
    /// Port to bind the server to
    pub port: u16,
    /// Whether to enable CORS
    pub enable_cors: bool,
    /// Concurrency used when a request gives none, or an unparseable one
    pub default_concurrency: usize,
    /// Requested concurrency is clamped to this value
    pub max_concurrency: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_WEB_PORT,
            enable_cors: true,
            default_concurrency: crate::DEFAULT_CONCURRENCY,
            max_concurrency: crate::MAX_CONCURRENCY,
        }
    }
}

impl WebConfig {
    /// Create a new web configuration with custom host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the host for the web server.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port for the web server.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable_cors: bool) -> Self {
        self.enable_cors = enable_cors;
        self
    }

    pub fn with_default_concurrency(mut self, concurrency: usize) -> Self {
        self.default_concurrency = concurrency;
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Get the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve the `concurrency` query value of a request.
    ///
    /// Missing or non-numeric values fall back to the default; numeric
    /// values are clamped to `1..=max_concurrency`.
    pub fn resolve_concurrency(&self, raw: Option<&str>) -> usize {
        let max = self.max_concurrency.max(1);
        match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
            Some(n) => n.clamp(1, max as i64) as usize,
            None => self.default_concurrency.clamp(1, max),
        }
    }
}
