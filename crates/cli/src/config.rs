use crate::{commands::Overrides, env::EnvManager, error::CliError};
use engine_runtime::execution::{
    layout::DEFAULT_STATE_DIR,
    settings::{DEFAULT_BATCH_SIZE, DEFAULT_CHUNK_SIZE, ExecutorSettings, WriteErrorPolicy},
};
use std::path::PathBuf;

pub const SOURCE_DATABASE_URL: &str = "SOURCE_DATABASE_URL";
pub const TARGET_DATABASE_URL: &str = "TARGET_DATABASE_URL";
pub const BATCH_SIZE: &str = "BATCH_SIZE";
pub const INSERT_CHUNK_SIZE: &str = "INSERT_CHUNK_SIZE";
pub const MIGRATION_STATE_DIR: &str = "MIGRATION_STATE_DIR";
pub const ON_WRITE_ERROR: &str = "ON_WRITE_ERROR";

/// Everything a `migrate` run needs, resolved from flags then environment.
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    pub source_url: String,
    pub target_url: String,
    pub state_dir: PathBuf,
    pub settings: ExecutorSettings,
}

impl MigratorConfig {
    pub fn resolve(env: &EnvManager, overrides: &Overrides) -> Result<Self, CliError> {
        let (source_url, target_url) = database_urls(env, overrides)?;
        Ok(Self {
            source_url,
            target_url,
            state_dir: state_dir(env, overrides),
            settings: ExecutorSettings {
                batch_size: size(env, BATCH_SIZE, overrides.batch_size, DEFAULT_BATCH_SIZE)?,
                chunk_size: size(
                    env,
                    INSERT_CHUNK_SIZE,
                    overrides.chunk_size,
                    DEFAULT_CHUNK_SIZE,
                )?,
                on_write_error: write_error_policy(env, overrides)?,
            },
        })
    }
}

pub fn database_urls(env: &EnvManager, overrides: &Overrides) -> Result<(String, String), CliError> {
    Ok((
        required(env, SOURCE_DATABASE_URL, overrides.source_url.as_deref())?,
        required(env, TARGET_DATABASE_URL, overrides.target_url.as_deref())?,
    ))
}

pub fn state_dir(env: &EnvManager, overrides: &Overrides) -> PathBuf {
    overrides
        .state_dir
        .clone()
        .or_else(|| env.get(MIGRATION_STATE_DIR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
}

fn required(env: &EnvManager, key: &str, flag: Option<&str>) -> Result<String, CliError> {
    flag.map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| env.get(key))
        .map(str::to_string)
        .ok_or_else(|| CliError::Config(format!("{key} must be set")))
}

fn size(env: &EnvManager, key: &str, flag: Option<usize>, default: usize) -> Result<usize, CliError> {
    let value = match (flag, env.get(key)) {
        (Some(value), _) => value,
        (None, Some(raw)) => raw
            .parse::<usize>()
            .map_err(|_| CliError::Config(format!("{key} must be a positive integer, got '{raw}'")))?,
        (None, None) => default,
    };

    if value == 0 {
        return Err(CliError::Config(format!("{key} must be greater than zero")));
    }
    Ok(value)
}

fn write_error_policy(env: &EnvManager, overrides: &Overrides) -> Result<WriteErrorPolicy, CliError> {
    match (overrides.on_write_error, env.get(ON_WRITE_ERROR)) {
        (Some(policy), _) => Ok(policy),
        (None, Some(raw)) => raw
            .parse()
            .map_err(|e| CliError::Config(format!("{ON_WRITE_ERROR}: {e}"))),
        (None, None) => Ok(WriteErrorPolicy::default()),
    }
}
