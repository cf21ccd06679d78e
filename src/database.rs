use sqlx::{PgPool, Pool, Postgres};
use std::time::Duration;

pub type Database = Pool<Postgres>;

/// Longest wait between two connection attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Connects with exponential backoff, then applies pending migrations.
pub async fn create_database_pool(database_url: &str, max_retries: u32) -> Result<Database, sqlx::Error> {
    let mut attempt = 0;
    let pool = loop {
        attempt += 1;
        match connect(database_url).await {
            Ok(pool) => break pool,
            Err(e) if attempt < max_retries => {
                let delay = backoff_delay(attempt);
                log::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                log::error!("Database unreachable after {} attempts", attempt);
                return Err(e);
            }
        }
    };

    sqlx::migrate!("./migrations").run(&pool).await?;

    log::info!("Connected to database successfully!");
    Ok(pool)
}

async fn connect(database_url: &str) -> Result<Database, sqlx::Error> {
    let pool = PgPool::connect(database_url).await?;

    // Test the connection
    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    Ok(pool)
}

/// True when a trivial query succeeds.
pub async fn is_ready(db: &Database) -> bool {
    sqlx::query("SELECT 1").fetch_one(db).await.is_ok()
}

fn backoff_delay(attempt: u32) -> Duration {
    let secs = 2u64.saturating_pow(attempt.min(16));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}
