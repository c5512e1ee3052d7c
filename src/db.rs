use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn connect_to_db(db_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20) // 20 concurrent connections
        .connect(db_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(pool)
}
