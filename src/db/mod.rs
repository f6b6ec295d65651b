//! Database connection management

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;

/// PostgreSQL database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    ///
    /// The service credential is used as the connection password, overriding
    /// any password embedded in the URL.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = PgConnectOptions::from_str(&config.url)?
            .password(config.service_role.expose());

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Extension trait for safe row access with logging
pub trait SafeRow {
    /// Try to get a value from a column, log error and return None if it fails
    fn try_get_log<'r, T>(&'r self, column: &str) -> Option<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>;
}

impl SafeRow for sqlx::postgres::PgRow {
    fn try_get_log<'r, T>(&'r self, column: &str) -> Option<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        use sqlx::Row;
        match self.try_get(column) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("Failed to read column '{}': {}", column, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;

    fn test_config() -> DatabaseConfig {
        DatabaseConfig {
            url: std::env::var("DATABASE_URL").unwrap_or_else(|_| {
                "postgres://postgres@localhost:5432/vendor_payout_test".to_string()
            }),
            service_role: Secret::new(
                std::env::var("DATABASE_SERVICE_ROLE").unwrap_or_else(|_| "postgres".to_string()),
            ),
        }
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL database"]
    async fn test_database_connect_success() {
        let db = Database::connect(&test_config()).await;
        assert!(db.is_ok(), "Should connect to PostgreSQL successfully");
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL database"]
    async fn test_database_connect_invalid_url() {
        let config = DatabaseConfig {
            url: "postgresql://invalid@localhost:9999/invalid".to_string(),
            service_role: Secret::new("invalid"),
        };
        assert!(Database::connect(&config).await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL database"]
    async fn test_database_health_check() {
        let db = Database::connect(&test_config())
            .await
            .expect("Failed to connect");
        assert!(db.health_check().await.is_ok(), "Health check should pass");
    }

    #[tokio::test]
    async fn test_malformed_url_rejected_without_network() {
        let config = DatabaseConfig {
            url: "not a url".to_string(),
            service_role: Secret::new("x"),
        };
        assert!(Database::connect(&config).await.is_err());
    }
}
