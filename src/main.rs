use clap::Parser;
use tracing::debug;

use jobmetrics::cli::Cli;
use jobmetrics::config::{self, DEFAULT_CONFIG_PATH};
use jobmetrics::runtime::modes::run_cli;
use jobmetrics::system::init_logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    config::init_config_from(cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));
    let config = config::get_config();

    // guard 必须存活到 main 结束，否则文件日志会丢失
    let _guard = init_logging(&config.logging);
    debug!("Configuration initialized");

    if let Err(e) = run_cli(cli.command).await {
        match e.downcast_ref::<jobmetrics::errors::JobMetricsError>() {
            Some(err) => eprintln!("{}", err.format_colored()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}
