//! Runtime configuration for the service and the CLI.
//!
//! Values come from command-line flags with environment fallbacks (see
//! [`crate::cli`]). Everything is validated before any socket is bound or
//! any model request is made.

use crate::error::ConfigError;
use crate::llm::providers::gemini::{DEFAULT_MODEL, GEMINI_BASE_URL};

/// Default listen host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default upload limit in MiB.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 20;

const BYTES_PER_MB: usize = 1024 * 1024;

/// Connection settings for the vision model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Gemini API key.
    pub api_key: String,
    /// Base URL of the Gemini REST API.
    pub api_base: String,
    /// Model identifier.
    pub model: String,
}

impl ModelConfig {
    /// Creates a model configuration with the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Builds a validated configuration from optional raw values.
    ///
    /// A missing or blank key is fatal.
    pub fn from_parts(
        api_key: Option<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let config = Self::new(api_key).with_api_base(api_base).with_model(model);
        config.validate()?;
        Ok(config)
    }

    /// Sets the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Checks the configuration for fatal problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ConfigError::InvalidApiBase(self.api_base.clone()));
        }
        Ok(())
    }
}

/// Settings for the HTTP service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Vision model settings.
    pub model: ModelConfig,
}

impl ServerConfig {
    /// Creates a server configuration with default listen settings.
    pub fn new(model: ModelConfig) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * BYTES_PER_MB,
            model,
        }
    }

    /// Sets the listen host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the listen port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the upload limit in MiB.
    pub fn with_max_upload_mb(mut self, mb: usize) -> Self {
        self.max_upload_bytes = mb.saturating_mul(BYTES_PER_MB);
        self
    }

    /// `host:port` form of the listen address, for logs.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checks the configuration for fatal problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate()?;
        if self.max_upload_bytes < BYTES_PER_MB {
            return Err(ConfigError::InvalidUploadLimit);
        }
        // Names such as `localhost` are resolved at bind time.
        let host = self.host.trim();
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidAddress(self.listen_address()));
        }
        Ok(())
    }
}
