//! Data access layer (Repository pattern)

pub mod action;
pub mod request;
pub mod workflow;

pub use action::ActionRepository;
pub use request::{RequestQuery, RequestRepository};
pub use workflow::WorkflowRepository;

use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;

use crate::config::DatabaseConfig;

/// Build the MySQL connection pool from configuration
pub async fn connect(config: &DatabaseConfig) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(&config.url)
        .await
}

/// `?, ?, ...` placeholder list for an `IN` clause
pub(crate) fn in_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_placeholders() {
        assert_eq!(in_placeholders(1), "?");
        assert_eq!(in_placeholders(3), "?, ?, ?");
    }
}
