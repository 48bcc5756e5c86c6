//! Configuration management for Approval Core

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,
    /// RBAC service configuration
    pub rbac: RbacConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// External RBAC service configuration
#[derive(Debug, Clone)]
pub struct RbacConfig {
    /// Whether RBAC scoping is enforced. Disabling it exposes unfiltered
    /// resources to every principal, so it must be opted out of explicitly.
    pub enabled: bool,
    /// Base URL of the RBAC service (e.g. http://rbac:8080/api/rbac/v1)
    pub url: String,
    /// Application name used when querying principal access
    pub app_name: String,
    /// Timeout for RBAC lookups, in seconds
    pub timeout_secs: u64,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://localhost:8080/api/rbac/v1".to_string(),
            app_name: "approval".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            rbac: RbacConfig {
                // Secure by default: only an explicit "false" disables scoping
                enabled: env::var("RBAC_ENABLED")
                    .map(|v| v.to_lowercase() != "false")
                    .unwrap_or(true),
                url: env::var("RBAC_URL")
                    .unwrap_or_else(|_| "http://localhost:8080/api/rbac/v1".to_string()),
                app_name: env::var("APP_NAME").unwrap_or_else(|_| "approval".to_string()),
                timeout_secs: env::var("RBAC_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("Invalid RBAC_TIMEOUT_SECS")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rbac_config_default_enabled() {
        let config = RbacConfig::default();
        assert!(config.enabled);
        assert_eq!(config.app_name, "approval");
        assert_eq!(config.timeout_secs, 10);
    }
}
