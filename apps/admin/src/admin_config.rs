use std::env;

use citadel_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl AdminConfig {
    pub fn load() -> AppResult<Self> {
        let database_url = required_non_empty_env("DATABASE_URL")?;
        let max_connections = parse_max_connections(env::var("DATABASE_MAX_CONNECTIONS").ok())?;

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty_env(name: &str) -> AppResult<String> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_max_connections(value: Option<String>) -> AppResult<u32> {
    let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
        return Ok(DEFAULT_MAX_CONNECTIONS);
    };

    match value.trim().parse::<u32>() {
        Ok(0) => Err(AppError::Validation(
            "DATABASE_MAX_CONNECTIONS must be greater than zero".to_owned(),
        )),
        Ok(parsed) => Ok(parsed),
        Err(error) => Err(AppError::Validation(format!(
            "invalid DATABASE_MAX_CONNECTIONS '{value}': {error}"
        ))),
    }
}
