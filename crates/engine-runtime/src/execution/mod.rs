pub mod executor;
pub mod layout;
pub mod runner;
pub mod settings;
pub mod summary;
