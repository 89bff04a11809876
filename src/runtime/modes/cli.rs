//! CLI mode
//!
//! Each subcommand builds the components it needs from the global configuration
//! and runs to completion, except `serve` which runs until Ctrl+C.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use tracing::info;

use crate::cli::{Commands, ConfigCommands};
use crate::config::{StaticConfig, get_config};
use crate::exporter::ExportOutcome;
use crate::job::{JobInstanceKey, JobRunId};
use crate::listener::{MapExecutionContext, MetricsListener};
use crate::registry::{InMemoryRegistry, MetricRegistry};
use crate::runtime::lifetime::{shutdown, startup};

pub async fn run_cli(command: Commands) -> Result<()> {
    match command {
        Commands::Replay {
            registry,
            run_id,
            context,
            instance,
            delete,
            save_registry,
            export,
        } => {
            replay(ReplayArgs {
                registry_path: registry,
                run_id: JobRunId::new(run_id),
                context_path: context,
                instance: instance.map(JobInstanceKey::new),
                delete,
                save_registry,
                export,
            })
            .await
        }
        Commands::Ping => ping().await,
        Commands::Serve { registry } => serve(&registry).await,
        Commands::Config { action } => match action {
            ConfigCommands::Generate { output_path, force } => {
                generate_config(output_path.as_deref(), force)
            }
            ConfigCommands::Show => show_config(),
        },
    }
}

pub struct ReplayArgs {
    pub registry_path: String,
    pub run_id: JobRunId,
    pub context_path: String,
    pub instance: Option<JobInstanceKey>,
    pub delete: bool,
    pub save_registry: Option<String>,
    pub export: bool,
}

fn load_registry(path: &str) -> Result<InMemoryRegistry> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read registry dump {}", path))?;
    let registry = InMemoryRegistry::from_json(&content)
        .with_context(|| format!("Failed to parse registry dump {}", path))?;
    info!("Loaded {} registry entries from {}", registry.len(), path);
    Ok(registry)
}

pub async fn replay(args: ReplayArgs) -> Result<()> {
    let config = get_config();
    let registry = Arc::new(load_registry(&args.registry_path)?);

    let delete = args.delete || config.listener.delete_metrics_on_job_finish;
    let listener = MetricsListener::new(registry.clone(), delete);

    let mut context = MapExecutionContext::open(&args.context_path, args.instance)
        .with_context(|| format!("Failed to open execution context {}", args.context_path))?;

    listener.before_job(&args.run_id);
    let report = listener
        .after_job(&args.run_id, &mut context)
        .context("Job-completion processing failed")?;

    println!("{}", report.rendered);
    println!(
        "{} {} counters, {} gauges merged into {} ({} registry entries reset)",
        "✓".bold().green(),
        report.snapshot.counters().len(),
        report.snapshot.gauges().len(),
        args.context_path,
        report.reset_count
    );

    if let Some(path) = &args.save_registry {
        let remaining: std::collections::BTreeMap<String, _> =
            registry.find_all().into_iter().collect();
        std::fs::write(path, serde_json::to_string_pretty(&remaining)?)
            .with_context(|| format!("Failed to write registry dump {}", path))?;
    }

    if args.export {
        if !config.exporter.enabled {
            bail!("--export requires exporter.enabled = true");
        }
        let exporter = startup::create_exporter(&config.exporter, registry).await?;
        match exporter.export().await {
            ExportOutcome::Sent(points) => {
                println!("{} exported {} points", "✓".bold().green(), points)
            }
            ExportOutcome::Empty => println!("registry empty, nothing exported"),
            ExportOutcome::Failed(e) => println!("{}", e.format_colored()),
        }
    }

    Ok(())
}

async fn ping() -> Result<()> {
    let config = get_config();
    let sink = startup::create_sink(&config.exporter)?;
    match sink.ping().await {
        Ok(()) => {
            println!(
                "{} {} sink at {}:{} is reachable",
                "✓".bold().green(),
                sink.name(),
                config.exporter.host,
                config.exporter.port
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", e.format_colored());
            Err(e.into())
        }
    }
}

async fn serve(registry_path: &str) -> Result<()> {
    let config = get_config();
    if !config.exporter.enabled {
        bail!("serve requires exporter.enabled = true");
    }

    let registry: Arc<dyn MetricRegistry> = Arc::new(load_registry(registry_path)?);
    let exporter = startup::create_exporter(&config.exporter, registry).await?;

    let handle = Arc::new(exporter).spawn();
    shutdown::listen_for_shutdown(handle).await;
    Ok(())
}

fn generate_config(output_path: Option<&str>, force: bool) -> Result<()> {
    let path = output_path.unwrap_or("jobmetrics.example.toml");
    if Path::new(path).exists() && !force {
        bail!("{} already exists, use --force to overwrite", path);
    }
    StaticConfig::default()
        .save_to_file(path)
        .with_context(|| format!("Failed to write {}", path))?;
    println!("{} sample configuration written to {}", "✓".bold().green(), path);
    Ok(())
}

fn show_config() -> Result<()> {
    let mut config = (*get_config()).clone();
    if !config.exporter.password.is_empty() {
        config.exporter.password = "********".to_string();
    }
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
