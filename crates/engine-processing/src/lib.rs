pub mod consumer;
pub mod error;
pub mod family;
pub mod producer;
pub mod state_manager;
pub mod transform;
