//! Connection pool for the managed Postgres database.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Name reported to the server in `pg_stat_activity`.
pub const APPLICATION_NAME: &str = "autoshop-api";

/// Pool settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Prepared statements cached per connection. Must be 0 behind a
    /// transaction-mode pooler, which cannot route prepared statements.
    pub statement_cache_capacity: usize,
}

fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, sqlx::Error> {
    Ok(PgConnectOptions::from_str(&config.url)?
        .application_name(APPLICATION_NAME)
        .statement_cache_capacity(config.statement_cache_capacity))
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
}

/// Connects eagerly; fails if the database cannot be reached.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    pool_options(config)
        .connect_with(connect_options(config)?)
        .await
}

/// Builds the pool without connecting. Connections open on first use.
pub fn create_lazy_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    Ok(pool_options(config).connect_lazy_with(connect_options(config)?))
}

/// Round trip to the database.
pub async fn ping(pool: &PgPool) -> Result<Duration, sqlx::Error> {
    let start = Instant::now();
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections: 5,
            min_connections: 0,
            connect_timeout_secs: 1,
            idle_timeout_secs: 60,
            statement_cache_capacity: 0,
        }
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(connect_options(&config("not a url")).is_err());
    }

    #[tokio::test]
    async fn test_lazy_pool_does_not_connect() {
        let pool = create_lazy_pool(&config("postgres://autoshop@127.0.0.1:1/autoshop")).unwrap();
        assert_eq!(pool.size(), 0);
    }
}
