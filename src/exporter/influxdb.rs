//! InfluxDB 1.x HTTP sink
//!
//! - `GET /ping` 作为握手（期望 204）
//! - `POST /write?db=<db>&precision=ms` 写入 line protocol
//! - ureq 为同步客户端，在 spawn_blocking 中调用

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};
use ureq::Agent;
use url::Url;

use crate::config::ExporterConfig;
use crate::errors::{JobMetricsError, Result};

use super::sink::MetricsSink;
use super::{ExportBatch, line_protocol};

pub struct InfluxDbSink {
    agent: Agent,
    ping_url: Url,
    write_url: Url,
    debug_payload: bool,
}

impl InfluxDbSink {
    pub fn from_config(config: &ExporterConfig) -> Result<Self> {
        let base = base_url(&config.host, config.port)?;

        let ping_url = base
            .join("ping")
            .map_err(|e| JobMetricsError::config(format!("Invalid InfluxDB URL: {}", e)))?;

        let mut write_url = base
            .join("write")
            .map_err(|e| JobMetricsError::config(format!("Invalid InfluxDB URL: {}", e)))?;
        {
            let mut query = write_url.query_pairs_mut();
            query.append_pair("db", &config.database);
            query.append_pair("precision", "ms");
            if !config.username.is_empty() {
                query.append_pair("u", &config.username);
                query.append_pair("p", &config.password);
            }
        }

        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();

        Ok(Self {
            agent,
            ping_url,
            write_url,
            debug_payload: config.debug_payload,
        })
    }

    /// Write URL without credentials, for logging
    pub fn endpoint(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.write_url.scheme(),
            self.write_url.host_str().unwrap_or_default(),
            self.write_url.port_or_known_default().unwrap_or_default(),
            self.write_url.path()
        )
    }

    fn ping_sync(agent: Agent, url: Url) -> Result<()> {
        let resp = agent
            .get(url.as_str())
            .call()
            .map_err(|e| JobMetricsError::sink_unreachable(format!("GET {}: {}", url, e)))?;
        trace!("InfluxDbSink: ping answered with {}", resp.status());
        Ok(())
    }

    fn write_sync(agent: Agent, url: Url, body: String) -> Result<()> {
        let resp = agent
            .post(url.as_str())
            .header("Content-Type", "text/plain; charset=utf-8")
            .send(body)?;
        trace!("InfluxDbSink: write answered with {}", resp.status());
        Ok(())
    }
}

/// `http://host:port/`; `host` may carry its own scheme
fn base_url(host: &str, port: u16) -> Result<Url> {
    let raw = if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}/", host.trim_end_matches('/'), port)
    } else {
        format!("http://{}:{}/", host, port)
    };
    Url::parse(&raw)
        .map_err(|e| JobMetricsError::config(format!("Invalid InfluxDB URL '{}': {}", raw, e)))
}

#[async_trait]
impl MetricsSink for InfluxDbSink {
    async fn ping(&self) -> Result<()> {
        let agent = self.agent.clone();
        let url = self.ping_url.clone();
        tokio::task::spawn_blocking(move || Self::ping_sync(agent, url))
            .await
            .map_err(|e| JobMetricsError::sink_unreachable(format!("ping task failed: {}", e)))?
    }

    async fn write(&self, batch: &ExportBatch) -> Result<usize> {
        let (body, lines) = line_protocol::encode(batch);
        if lines == 0 {
            return Ok(0);
        }
        if self.debug_payload {
            debug!("InfluxDbSink payload:\n{}", body.trim_end());
        }

        let agent = self.agent.clone();
        let url = self.write_url.clone();
        tokio::task::spawn_blocking(move || Self::write_sync(agent, url, body))
            .await
            .map_err(|e| JobMetricsError::export_failed(format!("write task failed: {}", e)))??;
        Ok(lines)
    }

    fn name(&self) -> &'static str {
        "influxdb"
    }
}
