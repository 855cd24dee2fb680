use engine_core::error::StoreError;
use thiserror::Error;

/// Errors raised by the Postgres adapters.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Column {column} could not be decoded: {reason}")]
    Decode { column: &'static str, reason: String },
}

impl ConnectorError {
    /// Network-level failures worth retrying while connecting. Errors the
    /// server answered with (bad password, unknown database) are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::Postgres(err) => err.as_db_error().is_none(),
            _ => false,
        }
    }
}

impl From<ConnectorError> for StoreError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::InvalidUrl(_) | ConnectorError::Tls(_) => {
                StoreError::Connection(err.to_string())
            }
            ConnectorError::Postgres(ref pg) if pg.is_closed() => {
                StoreError::Connection(err.to_string())
            }
            ConnectorError::Postgres(_) => StoreError::Query(err.to_string()),
            ConnectorError::Decode { .. } => StoreError::Decode(err.to_string()),
        }
    }
}
