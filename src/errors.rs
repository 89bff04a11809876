use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum JobMetricsError {
    MalformedMetricName(String),
    TypeMismatch(String),
    SinkUnreachable(String),
    ExportFailed(String),
    ContextStore(String),
    Serialization(String),
    Config(String),
    Validation(String),
}

impl JobMetricsError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            JobMetricsError::MalformedMetricName(_) => "E001",
            JobMetricsError::TypeMismatch(_) => "E002",
            JobMetricsError::SinkUnreachable(_) => "E003",
            JobMetricsError::ExportFailed(_) => "E004",
            JobMetricsError::ContextStore(_) => "E005",
            JobMetricsError::Serialization(_) => "E006",
            JobMetricsError::Config(_) => "E007",
            JobMetricsError::Validation(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            JobMetricsError::MalformedMetricName(_) => "Malformed Metric Name",
            JobMetricsError::TypeMismatch(_) => "Metric Type Mismatch",
            JobMetricsError::SinkUnreachable(_) => "Sink Unreachable",
            JobMetricsError::ExportFailed(_) => "Export Failed",
            JobMetricsError::ContextStore(_) => "Execution Context Store Error",
            JobMetricsError::Serialization(_) => "Serialization Error",
            JobMetricsError::Config(_) => "Configuration Error",
            JobMetricsError::Validation(_) => "Validation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            JobMetricsError::MalformedMetricName(msg) => msg,
            JobMetricsError::TypeMismatch(msg) => msg,
            JobMetricsError::SinkUnreachable(msg) => msg,
            JobMetricsError::ExportFailed(msg) => msg,
            JobMetricsError::ContextStore(msg) => msg,
            JobMetricsError::Serialization(msg) => msg,
            JobMetricsError::Config(msg) => msg,
            JobMetricsError::Validation(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于终端）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于日志）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for JobMetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for JobMetricsError {}

// 便捷的构造函数
impl JobMetricsError {
    pub fn malformed_metric_name<T: Into<String>>(msg: T) -> Self {
        JobMetricsError::MalformedMetricName(msg.into())
    }

    pub fn type_mismatch<T: Into<String>>(msg: T) -> Self {
        JobMetricsError::TypeMismatch(msg.into())
    }

    pub fn sink_unreachable<T: Into<String>>(msg: T) -> Self {
        JobMetricsError::SinkUnreachable(msg.into())
    }

    pub fn export_failed<T: Into<String>>(msg: T) -> Self {
        JobMetricsError::ExportFailed(msg.into())
    }

    pub fn context_store<T: Into<String>>(msg: T) -> Self {
        JobMetricsError::ContextStore(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        JobMetricsError::Serialization(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        JobMetricsError::Config(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        JobMetricsError::Validation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for JobMetricsError {
    fn from(err: std::io::Error) -> Self {
        JobMetricsError::ContextStore(err.to_string())
    }
}

impl From<serde_json::Error> for JobMetricsError {
    fn from(err: serde_json::Error) -> Self {
        JobMetricsError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for JobMetricsError {
    fn from(err: config::ConfigError) -> Self {
        JobMetricsError::Config(err.to_string())
    }
}

#[cfg(feature = "influxdb")]
impl From<ureq::Error> for JobMetricsError {
    fn from(err: ureq::Error) -> Self {
        JobMetricsError::ExportFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JobMetricsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            JobMetricsError::malformed_metric_name("a"),
            JobMetricsError::type_mismatch("a"),
            JobMetricsError::sink_unreachable("a"),
            JobMetricsError::export_failed("a"),
            JobMetricsError::context_store("a"),
            JobMetricsError::serialization("a"),
            JobMetricsError::config("a"),
            JobMetricsError::validation("a"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = JobMetricsError::sink_unreachable("connection refused");
        assert_eq!(err.to_string(), "Sink Unreachable: connection refused");
        assert_eq!(err.message(), "connection refused");
    }

    #[test]
    fn test_io_error_maps_to_context_store() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: JobMetricsError = io.into();
        assert_eq!(err.code(), "E005");
    }
}
