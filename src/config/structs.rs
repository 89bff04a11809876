use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{JobMetricsError, Result};

/// 默认配置文件名
pub const DEFAULT_CONFIG_PATH: &str = "jobmetrics.toml";

/// 环境变量前缀，例如 JM__EXPORTER__PORT=8087
pub const ENV_PREFIX: &str = "JM";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - listener: 作业完成时的指标处理
/// - exporter: InfluxDB 定时导出
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StaticConfig {
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub exporter: ExporterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > 配置文件 > 默认值
    /// ENV 前缀：JM，分隔符：__
    /// 示例：JM__LISTENER__DELETE_METRICS_ON_JOB_FINISH=true
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        use config::{Config, Environment, File};

        let path = path.as_ref();
        let settings = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::from(path).required(false))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StaticConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`try_load_from`](Self::try_load_from), falling back to defaults on error
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load_from(path) {
            Ok(config) => {
                if path.exists() {
                    eprintln!("[INFO] Configuration loaded from: {}", path.display());
                }
                config
            }
            Err(e) => {
                eprintln!("[ERROR] {}", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.exporter.interval_secs == 0 {
            return Err(JobMetricsError::config(
                "exporter.interval_secs must be greater than 0",
            ));
        }
        if self.exporter.enabled && self.exporter.database.is_empty() {
            return Err(JobMetricsError::config(
                "exporter.database must be set when the exporter is enabled",
            ));
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(JobMetricsError::config(format!(
                "logging.format must be 'text' or 'json', got '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| JobMetricsError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| JobMetricsError::config(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| JobMetricsError::config(e.to_string()))?;
        Ok(())
    }
}

/// 作业监听器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ListenerConfig {
    /// 作业结束并写入执行上下文后，是否从注册表删除该次运行的指标
    #[serde(default)]
    pub delete_metrics_on_job_finish: bool,
}

/// InfluxDB 导出配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExporterConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_exporter_host")]
    pub host: String,
    #[serde(default = "default_exporter_port")]
    pub port: u16,
    #[serde(default = "default_exporter_database")]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// 所有 measurement 名称的前缀
    #[serde(default = "default_exporter_environment")]
    pub environment: String,
    #[serde(default = "default_exporter_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_exporter_timeout")]
    pub timeout_secs: u64,
    /// 以 debug 级别输出每次写入的报文
    #[serde(default)]
    pub debug_payload: bool,
}

impl ExporterConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_exporter_host() -> String {
    "127.0.0.1".to_string()
}

fn default_exporter_port() -> u16 {
    8086
}

fn default_exporter_database() -> String {
    "batch".to_string()
}

fn default_exporter_environment() -> String {
    "dev".to_string()
}

fn default_exporter_interval() -> u64 {
    60
}

fn default_exporter_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_exporter_host(),
            port: default_exporter_port(),
            database: default_exporter_database(),
            username: String::new(),
            password: String::new(),
            environment: default_exporter_environment(),
            interval_secs: default_exporter_interval(),
            timeout_secs: default_exporter_timeout(),
            debug_payload: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
