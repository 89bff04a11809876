use std::path::Path;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Falls back to defaults if `init_config_from` was
/// never called.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .load_full()
}

/// Initialize the global configuration from a file (`jobmetrics.toml` unless
/// `--config` is given)
///
/// If the file doesn't exist, uses in-memory defaults. Only the first
/// initialization loads; later calls are ignored.
///
/// # Examples
/// ```no_run
/// use jobmetrics::config::{DEFAULT_CONFIG_PATH, init_config_from};
/// init_config_from(DEFAULT_CONFIG_PATH);
/// ```
pub fn init_config_from<P: AsRef<Path>>(path: P) {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load_from(path)));
}
