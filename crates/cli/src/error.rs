use connectors::error::ConnectorError;
use engine_core::error::StateError;
use engine_runtime::error::MigrationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("Failed to connect: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Migration failed: {0}")]
    Runner(#[from] MigrationError),

    #[error("Failed to read migration state: {0}")]
    State(#[from] StateError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}
