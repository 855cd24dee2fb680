use crate::error::CliError;
use connectors::sql::postgres::{source::PgSource, target::PgTarget};
use engine_core::retry::RetryPolicy;
use tracing::info;

/// Opens both databases, retrying transient connection failures.
pub async fn connect(source_url: &str, target_url: &str) -> Result<(PgSource, PgTarget), CliError> {
    let retry = RetryPolicy::for_connection();
    let source = PgSource::connect(source_url, &retry).await?;
    let target = PgTarget::connect(target_url, &retry).await?;
    Ok((source, target))
}

pub async fn test_connections(source_url: &str, target_url: &str) -> Result<(), CliError> {
    let (source, target) = connect(source_url, target_url).await?;

    source.ping().await?;
    info!("Source database reachable");
    target.ping().await?;
    info!("Target database reachable");
    Ok(())
}
