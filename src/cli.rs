//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for jobmetrics using clap's derive macros.

use clap::{Parser, Subcommand};

/// jobmetrics - job-scoped batch metrics with InfluxDB export
#[derive(Parser)]
#[command(name = "jobmetrics")]
#[command(version)]
#[command(about = "Job-scoped batch metrics with scheduled InfluxDB export", long_about = None)]
pub struct Cli {
    /// Configuration file (default: jobmetrics.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the job-completion listener against a registry dump
    ///
    /// Merges the run's metrics into the execution context file, prints the
    /// report and optionally exports the registry once.
    Replay {
        /// Registry dump: JSON object of metric name -> value
        registry: String,

        /// Run identifier the metrics were recorded under
        #[arg(long)]
        run_id: String,

        /// Execution context file of the job instance (created if missing)
        #[arg(long)]
        context: String,

        /// Job instance key stored in / checked against the context file
        #[arg(long)]
        instance: Option<String>,

        /// Reset harvested entries (overrides listener.delete_metrics_on_job_finish)
        #[arg(long)]
        delete: bool,

        /// Write the registry left after retention back to this file
        #[arg(long)]
        save_registry: Option<String>,

        /// Export the registry once after the listener ran
        #[arg(long)]
        export: bool,
    },

    /// Check that the configured sink answers
    Ping,

    /// Export a registry dump on the configured schedule until Ctrl+C
    Serve {
        /// Registry dump: JSON object of metric name -> value
        #[arg(long)]
        registry: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: jobmetrics.example.toml)
        output_path: Option<String>,

        /// Force overwrite
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}
