//! Service configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the record service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Connection pool size
    pub pool_size: usize,

    /// Per-operation time budget in seconds
    pub operation_timeout_secs: u64,

    /// Enable CORS for the API
    pub enable_cors: bool,

    /// Enable request logging
    pub enable_request_logging: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".parse().unwrap(),
            database_url: "postgresql://localhost/myeongbu".to_string(),
            pool_size: 10,
            operation_timeout_secs: 10,
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

impl ServiceConfig {
    /// Create a new config builder
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Load configuration from environment variables
    ///
    /// `DATABASE_URL` (or `POSTGRES_URL`) selects the database, `PORT`
    /// overrides the listen port, and `MYEONGBU_*` variables cover the
    /// rest.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DATABASE_URL").or_else(|_| std::env::var("POSTGRES_URL")) {
            config.database_url = url;
        }

        if let Ok(bind) = std::env::var("MYEONGBU_BIND") {
            config.bind_address = bind.parse().map_err(|_| ConfigError::InvalidValue {
                field: "MYEONGBU_BIND".to_string(),
                reason: format!("Invalid address: {}", bind),
            })?;
        }

        if let Ok(port) = std::env::var("PORT") {
            let port: u16 = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "PORT".to_string(),
                reason: format!("Invalid port: {}", port),
            })?;
            config.bind_address.set_port(port);
        }

        if let Some(size) = std::env::var("MYEONGBU_POOL_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.pool_size = size;
        }

        if let Some(secs) = std::env::var("MYEONGBU_OP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.operation_timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }

    /// Per-operation time budget as a `Duration`
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "database_url".to_string(),
            });
        }

        if self.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pool_size".to_string(),
                reason: "Must allow at least 1 connection".to_string(),
            });
        }

        if self.operation_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "operation_timeout_secs".to_string(),
                reason: "Time budget must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for ServiceConfig
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    bind_address: Option<SocketAddr>,
    database_url: Option<String>,
    pool_size: Option<usize>,
    operation_timeout_secs: Option<u64>,
    enable_cors: Option<bool>,
    enable_request_logging: Option<bool>,
}

impl ServiceConfigBuilder {
    /// Set bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = Some(addr);
        self
    }

    /// Set bind address from string
    pub fn bind_address_str(mut self, addr: &str) -> Result<Self, ConfigError> {
        self.bind_address = Some(addr.parse().map_err(|_| ConfigError::InvalidValue {
            field: "bind_address".to_string(),
            reason: format!("Invalid address: {}", addr),
        })?);
        Ok(self)
    }

    /// Set database URL
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Set pool size
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = Some(size);
        self
    }

    /// Set per-operation time budget
    pub fn operation_timeout_secs(mut self, secs: u64) -> Self {
        self.operation_timeout_secs = Some(secs);
        self
    }

    /// Enable/disable CORS
    pub fn enable_cors(mut self, enable: bool) -> Self {
        self.enable_cors = Some(enable);
        self
    }

    /// Enable/disable request logging
    pub fn enable_request_logging(mut self, enable: bool) -> Self {
        self.enable_request_logging = Some(enable);
        self
    }

    /// Build the config
    pub fn build(self) -> Result<ServiceConfig, ConfigError> {
        let defaults = ServiceConfig::default();
        let config = ServiceConfig {
            bind_address: self.bind_address.unwrap_or(defaults.bind_address),
            database_url: self.database_url.unwrap_or(defaults.database_url),
            pool_size: self.pool_size.unwrap_or(defaults.pool_size),
            operation_timeout_secs: self
                .operation_timeout_secs
                .unwrap_or(defaults.operation_timeout_secs),
            enable_cors: self.enable_cors.unwrap_or(defaults.enable_cors),
            enable_request_logging: self
                .enable_request_logging
                .unwrap_or(defaults.enable_request_logging),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    InvalidValue { field: String, reason: String },
    MissingField { field: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            Self::MissingField { field } => {
                write!(f, "Missing required field: {}", field)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.operation_timeout_secs, 10);
        assert_eq!(config.pool_size, 10);
    }

    #[test]
    fn test_config_builder() {
        let config = ServiceConfig::builder()
            .database_url("postgresql://localhost/school")
            .pool_size(4)
            .operation_timeout_secs(5)
            .build()
            .unwrap();

        assert_eq!(config.database_url, "postgresql://localhost/school");
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.operation_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_validation_fails() {
        let result = ServiceConfig::builder().operation_timeout_secs(0).build();
        assert!(result.is_err());

        let result = ServiceConfig::builder().pool_size(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder_with_address() {
        let config = ServiceConfig::builder()
            .bind_address_str("127.0.0.1:9000")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.bind_address.port(), 9000);
    }
}
