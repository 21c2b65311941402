use http::uri::Authority;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_UPSTREAM_HOST: &str = "api.cerebras.ai";
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Empty upstream host")]
    EmptyUpstreamHost,

    #[error("Upstream host must be a bare host[:port], got: {0}")]
    InvalidUpstreamHost(String),

    #[error("Upstream timeout cannot be 0")]
    InvalidTimeout,

    #[error("Request body limit cannot be 0")]
    InvalidBodyLimit,
}

/// Proxy configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for incoming requests
    pub listener: Listener,
    /// Admin listener for health and readiness checks
    pub admin_listener: Listener,
    /// The single upstream API every request is forwarded to
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// How many times a request is re-sent with a different key after the
    /// upstream answers 429 or 401. Total attempts are `max_retries + 1`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Largest inbound request body the proxy will buffer, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

impl Config {
    /// Validates the proxy configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.upstream.validate()?;
        if self.max_body_bytes == 0 {
            return Err(ValidationError::InvalidBodyLimit);
        }
        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamScheme {
    #[default]
    Https,
    Http,
}

impl UpstreamScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamScheme::Https => "https",
            UpstreamScheme::Http => "http",
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    /// Host (and optional port) of the upstream API, e.g. "api.cerebras.ai".
    /// Also sent as the `Host` header on every forwarded request.
    #[serde(default = "default_upstream_host")]
    pub host: String,
    #[serde(default)]
    pub scheme: UpstreamScheme,
    /// Overall timeout for a single upstream attempt. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_upstream_host() -> String {
    DEFAULT_UPSTREAM_HOST.to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            host: default_upstream_host(),
            scheme: UpstreamScheme::default(),
            timeout_secs: None,
        }
    }
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.is_empty() {
            return Err(ValidationError::EmptyUpstreamHost);
        }

        let authority = self
            .host
            .parse::<Authority>()
            .map_err(|_| ValidationError::InvalidUpstreamHost(self.host.clone()))?;
        if authority.as_str().contains('@') {
            return Err(ValidationError::InvalidUpstreamHost(self.host.clone()));
        }

        if self.timeout_secs == Some(0) {
            return Err(ValidationError::InvalidTimeout);
        }

        Ok(())
    }
}
