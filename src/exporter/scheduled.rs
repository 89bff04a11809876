//! 定时导出任务
//!
//! 每个周期读取整个注册表（不区分作业），打上同一时间戳后写入 sink。
//! - 失败只记录日志，不重试、不缓存，下一周期发送当时的注册表内容
//! - 导出从不修改注册表
//! - 停止信号只在两次导出之间检查，进行中的导出会完整执行

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::errors::{JobMetricsError, Result};
use crate::registry::MetricRegistry;

use super::ExportBatch;
use super::sink::MetricsSink;

#[derive(Debug, Clone)]
pub struct ExporterOptions {
    /// Label prepended to every measurement
    pub environment: String,
    pub interval: Duration,
}

/// Result of one export tick
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// Points accepted by the sink
    Sent(usize),
    /// Registry was empty, nothing sent
    Empty,
    Failed(JobMetricsError),
}

pub struct ScheduledExporter {
    registry: Arc<dyn MetricRegistry>,
    sink: Arc<dyn MetricsSink>,
    options: ExporterOptions,
}

impl ScheduledExporter {
    /// Build an exporter after a successful handshake with the sink.
    ///
    /// Fails with `Validation` for a zero interval and with `SinkUnreachable` when
    /// the sink does not answer; there is no retry at this point.
    pub async fn connect(
        registry: Arc<dyn MetricRegistry>,
        sink: Arc<dyn MetricsSink>,
        options: ExporterOptions,
    ) -> Result<Self> {
        if options.interval.is_zero() {
            return Err(JobMetricsError::validation(
                "export interval must be greater than zero",
            ));
        }

        if let Err(e) = sink.ping().await {
            let err = match e {
                JobMetricsError::SinkUnreachable(_) => e,
                other => JobMetricsError::sink_unreachable(other.message().to_string()),
            };
            return Err(err);
        }

        info!(
            "ScheduledExporter connected to {} sink (environment '{}', every {:?})",
            sink.name(),
            options.environment,
            options.interval
        );
        Ok(Self {
            registry,
            sink,
            options,
        })
    }

    pub fn options(&self) -> &ExporterOptions {
        &self.options
    }

    /// Ship the current registry contents once. Never fails: errors are logged and
    /// returned as [`ExportOutcome::Failed`].
    pub async fn export(&self) -> ExportOutcome {
        let entries = self.registry.find_all();
        if entries.is_empty() {
            trace!("ScheduledExporter: registry empty, nothing to export");
            return ExportOutcome::Empty;
        }

        let batch = ExportBatch {
            environment: self.options.environment.clone(),
            timestamp: Utc::now(),
            entries,
        };

        match self.sink.write(&batch).await {
            Ok(points) => {
                debug!(
                    "ScheduledExporter: exported {} points to {}",
                    points,
                    self.sink.name()
                );
                ExportOutcome::Sent(points)
            }
            Err(e) => {
                warn!(
                    "ScheduledExporter: export of {} entries to {} failed: {}",
                    batch.entries.len(),
                    self.sink.name(),
                    e
                );
                ExportOutcome::Failed(e)
            }
        }
    }

    /// Export on every interval until `stop` turns true or its sender is dropped.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval 的第一次 tick 立即完成，先等满一个周期
        ticker.tick().await;

        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    self.export().await;
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("ScheduledExporter: stopped");
    }

    /// Run the schedule on a background task
    pub fn spawn(self: Arc<Self>) -> ExporterHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            self.run(stop_rx).await;
        });
        ExporterHandle { stop: stop_tx, task }
    }
}

/// Handle to a spawned export schedule
pub struct ExporterHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ExporterHandle {
    /// Ask the schedule to stop after the tick in flight, if any
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Stop and wait for the background task to finish
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.task.await {
            warn!("ScheduledExporter task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
