//! Citadel ACL administration command.

#![forbid(unsafe_code)]

mod admin_config;
mod commands;

use std::sync::Arc;

use citadel_application::AclService;
use citadel_core::AppError;
use citadel_infrastructure::{MIGRATOR, PostgresAclRepository, PostgresUserDirectory};
use clap::Parser;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::admin_config::{AdminConfig, init_tracing};
use crate::commands::{AdminCli, AdminCommand};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let command = AdminCli::parse().command;
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AdminConfig::load()?;
    let pool = connect_and_migrate(&config).await?;

    if command == AdminCommand::Migrate {
        info!("migrations applied");
        return Ok(());
    }

    let service = AclService::new(
        Arc::new(PostgresAclRepository::new(pool.clone())),
        Arc::new(PostgresUserDirectory::new(pool)),
    );

    let output = command.execute(&service).await?;
    println!("{output}");
    Ok(())
}

async fn connect_and_migrate(config: &AdminConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Persistence(format!("failed to connect to database: {error}")))?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|error| AppError::Persistence(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}
