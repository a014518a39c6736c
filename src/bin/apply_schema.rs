//! Utility to create the tables the API needs.
//!
//! Usage: `cargo run --bin apply_schema [path/to/schema.sql]`

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

const DEFAULT_SCHEMA_PATH: &str = "schema.sql";

/// Connects to `DATABASE_URL` and runs every statement of the schema file.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("DB_URL"))
        .map_err(|_| anyhow::anyhow!("DATABASE_URL or DB_URL must be set"))?;
    let schema_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SCHEMA_PATH.to_string());

    let schema = tokio::fs::read_to_string(&schema_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", schema_path, e))?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    sqlx::raw_sql(&schema).execute(&pool).await?;
    println!("Applied {}", schema_path);

    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT table_name::text FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_name IN ('candidates', 'company_data_cache') \
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await?;

    for (table,) in &tables {
        println!("- {}", table);
    }

    Ok(())
}
