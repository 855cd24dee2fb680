pub mod connectors;
pub mod error;
pub mod retry;
pub mod shutdown;
pub mod state;
