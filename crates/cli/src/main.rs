use crate::{
    commands::{Commands, Overrides},
    config::MigratorConfig,
    env::EnvManager,
    error::CliError,
};
use clap::Parser;
use engine_core::shutdown::ShutdownHandle;
use engine_runtime::execution::{
    layout::StateLayout,
    runner::{MigrationRunner, Selection, Stores},
    settings::ExecutorSettings,
};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod conn;
mod env;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(name = "migrator", version, about = "Resumable legacy user and resume migration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Exiting with failure");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Migrate { family, overrides } => {
            let env = load_env(&overrides)?;
            let config = MigratorConfig::resolve(&env, &overrides)?;
            migrate(family.into(), config).await
        }
        Commands::Progress {
            family,
            json,
            overrides,
        } => {
            let env = load_env(&overrides)?;
            let layout = StateLayout::new(config::state_dir(&env, &overrides));
            let runner =
                MigrationRunner::new(layout, ExecutorSettings::default(), ShutdownHandle::new());
            let reports = runner.progress(family.into()).await?;
            output::print_progress(&reports, json)
        }
        Commands::TestConn { overrides } => {
            let env = load_env(&overrides)?;
            let (source_url, target_url) = config::database_urls(&env, &overrides)?;
            conn::test_connections(&source_url, &target_url).await
        }
    }
}

fn load_env(overrides: &Overrides) -> Result<EnvManager, CliError> {
    let mut env = EnvManager::from_process();
    env.load_dotenv(overrides.env_file.as_deref())?;
    Ok(env)
}

async fn migrate(selection: Selection, config: MigratorConfig) -> Result<(), CliError> {
    info!(
        %selection,
        state_dir = %config.state_dir.display(),
        batch_size = config.settings.batch_size,
        chunk_size = config.settings.chunk_size,
        "Starting migrator"
    );

    let (source, target) = conn::connect(&config.source_url, &config.target_url).await?;

    let shutdown = ShutdownHandle::new();
    shutdown::register_handlers(shutdown.clone());

    let stores = Stores {
        users_source: &source,
        users_target: &target,
        resumes_source: &source,
        resumes_target: &target,
    };
    let runner = MigrationRunner::new(StateLayout::new(&config.state_dir), config.settings, shutdown);
    let outcomes = runner.run(selection, &stores).await?;

    output::print_summary(&outcomes);
    Ok(())
}
