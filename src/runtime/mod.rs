//! Application lifecycle and execution modes
//!
//! - `lifetime`: wiring components from configuration, shutdown
//! - `modes`: CLI command handlers

pub mod lifetime;
#[cfg(feature = "cli")]
pub mod modes;
