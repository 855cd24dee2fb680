pub mod filter;
pub mod reader;
