use std::str::FromStr;

use color_eyre::eyre::{Result, eyre};
use sqlite_es::init_tables;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

const IN_MEMORY_URI: &str = "sqlite::memory:";

/// Event store for a single run. Nothing touches disk.
///
/// Each in-memory connection is its own database, so the pool is pinned to one
/// connection that is never recycled.
pub async fn in_memory_event_pool() -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(IN_MEMORY_URI)?;
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await
        .map_err(|e| eyre!(e))?;

    init_tables(&pool)
        .await
        .map_err(|e| eyre!("Failed to initialize event tables: {:?}", e))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use crate::store::in_memory_event_pool;

    #[tokio::test]
    async fn creates_event_tables() {
        let pool = in_memory_event_pool().await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
