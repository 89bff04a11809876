//! CLI command handlers

pub mod cli;

pub use cli::run_cli;
