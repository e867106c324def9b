use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::get_config;
use crate::error::Result;

const MAX_CONNECTIONS: u32 = 50;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

fn options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

pub async fn create_pool() -> Result<PgPool> {
    let config = get_config();
    let pool = options().connect(&config.database_url).await?;
    tracing::info!(max_connections = MAX_CONNECTIONS, "database pool ready");
    Ok(pool)
}

/// Pool that defers connecting until the first query.
pub fn lazy_pool(database_url: &str) -> Result<PgPool> {
    Ok(options().connect_lazy(database_url)?)
}
