//! Migration CLI tool.
//!
//! Reads `DATABASE_URL` and accepts the standard `up`/`down`/`fresh`/`status`
//! subcommands.

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    cli::run_cli(migration::Migrator).await;
}
