//! ScheduledExporter 集成测试
//!
//! 使用内存 sink 验证握手、单次导出和定时调度；
//! influxdb feature 下再用本地 HTTP 桩验证实际请求。

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::time::Duration;

use jobmetrics::errors::{JobMetricsError, Result};
use jobmetrics::exporter::{
    ExportBatch, ExportOutcome, ExporterOptions, MetricsSink, ScheduledExporter,
};
use jobmetrics::registry::{InMemoryRegistry, MetricRegistry};

// =============================================================================
// 测试 sink
// =============================================================================

#[derive(Default)]
struct RecordingSink {
    reachable: bool,
    fail_writes: AtomicBool,
    pings: AtomicUsize,
    batches: Mutex<Vec<ExportBatch>>,
}

impl RecordingSink {
    fn reachable() -> Arc<Self> {
        Arc::new(Self {
            reachable: true,
            ..Self::default()
        })
    }

    fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    fn last_batch(&self) -> ExportBatch {
        self.batches.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl MetricsSink for RecordingSink {
    async fn ping(&self) -> Result<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.reachable {
            Ok(())
        } else {
            Err(JobMetricsError::export_failed("connection refused"))
        }
    }

    async fn write(&self, batch: &ExportBatch) -> Result<usize> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(JobMetricsError::export_failed("503 Service Unavailable"));
        }
        self.batches.lock().unwrap().push(batch.clone());
        Ok(batch.entries.len())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

fn options(interval: Duration) -> ExporterOptions {
    ExporterOptions {
        environment: "test".to_string(),
        interval,
    }
}

async fn connect(
    registry: Arc<InMemoryRegistry>,
    sink: Arc<RecordingSink>,
) -> ScheduledExporter {
    ScheduledExporter::connect(registry, sink, options(Duration::from_secs(60)))
        .await
        .unwrap()
}

fn sorted(mut entries: Vec<(String, jobmetrics::registry::MetricValue)>) -> Vec<String> {
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().map(|(name, _)| name).collect()
}

// =============================================================================
// 握手
// =============================================================================

#[tokio::test]
async fn test_connect_fails_when_sink_unreachable() {
    let sink = Arc::new(RecordingSink::default());
    let registry = Arc::new(InMemoryRegistry::new());

    let result =
        ScheduledExporter::connect(registry, sink.clone(), options(Duration::from_secs(60))).await;

    let err = result.err().unwrap();
    assert_eq!(err.code(), "E003");
    assert_eq!(sink.pings.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_connect_rejects_zero_interval() {
    let sink = RecordingSink::reachable();
    let registry = Arc::new(InMemoryRegistry::new());

    let result = ScheduledExporter::connect(registry, sink.clone(), options(Duration::ZERO)).await;

    assert_eq!(result.err().unwrap().code(), "E008");
    // 配置错误时不做握手
    assert_eq!(sink.pings.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_connect_pings_once() {
    let sink = RecordingSink::reachable();
    let registry = Arc::new(InMemoryRegistry::new());

    let exporter = connect(registry, sink.clone()).await;

    assert_eq!(exporter.options().environment, "test");
    assert_eq!(sink.pings.load(Ordering::SeqCst), 1);
    assert_eq!(sink.batch_count(), 0);
}

// =============================================================================
// 单次导出
// =============================================================================

#[tokio::test]
async fn test_export_sends_whole_registry() {
    let sink = RecordingSink::reachable();
    let registry = Arc::new(InMemoryRegistry::new());
    registry.increment("counter.batch.r1.itemsRead", 10);
    registry.increment("counter.batch.r2.itemsRead", 3);
    registry.observe_gauge("gauge.batch.r1.lag", 0.25);
    registry.increment("counter.http.requests", 1);

    let exporter = connect(registry.clone(), sink.clone()).await;

    assert_eq!(exporter.export().await, ExportOutcome::Sent(4));

    let batch = sink.last_batch();
    assert_eq!(batch.environment, "test");
    assert_eq!(sorted(batch.entries), sorted(registry.find_all()));
}

#[tokio::test]
async fn test_export_does_not_mutate_registry() {
    let sink = RecordingSink::reachable();
    let registry = Arc::new(InMemoryRegistry::new());
    registry.increment("counter.batch.r1.itemsRead", 10);

    let exporter = connect(registry.clone(), sink).await;
    exporter.export().await;
    exporter.export().await;

    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.get("counter.batch.r1.itemsRead").and_then(|v| v.as_integer()),
        Some(10)
    );
}

#[tokio::test]
async fn test_empty_registry_sends_nothing() {
    let sink = RecordingSink::reachable();
    let registry = Arc::new(InMemoryRegistry::new());

    let exporter = connect(registry, sink.clone()).await;

    assert_eq!(exporter.export().await, ExportOutcome::Empty);
    assert_eq!(sink.batch_count(), 0);
}

#[tokio::test]
async fn test_failed_export_is_not_buffered() {
    let sink = RecordingSink::reachable();
    let registry = Arc::new(InMemoryRegistry::new());
    registry.increment("counter.batch.r1.itemsRead", 10);

    let exporter = connect(registry.clone(), sink.clone()).await;

    sink.fail_writes.store(true, Ordering::SeqCst);
    let outcome = exporter.export().await;
    assert!(matches!(outcome, ExportOutcome::Failed(ref e) if e.code() == "E004"));

    // 下一次导出发送当时的注册表，而不是补发失败的批次
    registry.reset("counter.batch.r1.itemsRead");
    registry.increment("counter.batch.r2.itemsRead", 5);
    sink.fail_writes.store(false, Ordering::SeqCst);

    assert_eq!(exporter.export().await, ExportOutcome::Sent(1));
    assert_eq!(sink.batch_count(), 1);
    assert_eq!(
        sorted(sink.last_batch().entries),
        vec!["counter.batch.r2.itemsRead".to_string()]
    );
}

// =============================================================================
// 定时调度
// =============================================================================

#[tokio::test]
async fn test_schedule_exports_until_stopped() {
    let sink = RecordingSink::reachable();
    let registry = Arc::new(InMemoryRegistry::new());
    registry.increment("counter.batch.r1.itemsRead", 1);

    let exporter = Arc::new(
        ScheduledExporter::connect(registry, sink.clone(), options(Duration::from_millis(20)))
            .await
            .unwrap(),
    );
    let handle = exporter.spawn();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!handle.is_finished());

    tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
        .await
        .expect("exporter did not stop");

    let exported = sink.batch_count();
    assert!(exported >= 1, "expected at least one export, got {}", exported);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(sink.batch_count(), exported);
}

#[tokio::test]
async fn test_schedule_waits_one_interval_before_first_export() {
    let sink = RecordingSink::reachable();
    let registry = Arc::new(InMemoryRegistry::new());
    registry.increment("counter.batch.r1.itemsRead", 1);

    let exporter = Arc::new(
        ScheduledExporter::connect(registry, sink.clone(), options(Duration::from_secs(3600)))
            .await
            .unwrap(),
    );
    let handle = exporter.spawn();

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.shutdown().await;

    assert_eq!(sink.batch_count(), 0);
}

// =============================================================================
// InfluxDB
// =============================================================================

#[cfg(feature = "influxdb")]
mod influxdb {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    use super::*;
    use jobmetrics::config::ExporterConfig;
    use jobmetrics::exporter::InfluxDbSink;

    /// One captured HTTP request: request line and body
    type Captured = (String, String);

    /// Answers `requests` connections with 204 and reports what it received
    fn stub_server(requests: usize) -> (u16, mpsc::Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for stream in listener.incoming().take(requests) {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();

                let mut content_length = 0;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    let header = header.trim_end();
                    if header.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = header.split_once(':')
                        && name.eq_ignore_ascii_case("content-length")
                    {
                        content_length = value.trim().parse().unwrap();
                    }
                }

                let mut body = vec![0; content_length];
                reader.read_exact(&mut body).unwrap();

                stream
                    .write_all(b"HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n")
                    .unwrap();
                tx.send((
                    request_line.trim_end().to_string(),
                    String::from_utf8(body).unwrap(),
                ))
                .unwrap();
            }
        });

        (port, rx)
    }

    fn config(port: u16) -> ExporterConfig {
        ExporterConfig {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port,
            database: "batch".to_string(),
            environment: "prod".to_string(),
            timeout_secs: 2,
            ..ExporterConfig::default()
        }
    }

    #[tokio::test]
    async fn test_unreachable_influxdb_fails_connect() {
        let sink = Arc::new(InfluxDbSink::from_config(&config(1)).unwrap());
        let registry = Arc::new(InMemoryRegistry::new());

        let result =
            ScheduledExporter::connect(registry, sink, options(Duration::from_secs(60))).await;
        assert_eq!(result.err().unwrap().code(), "E003");
    }

    #[tokio::test]
    async fn test_ping_then_write_line_protocol() {
        let (port, requests) = stub_server(2);
        let sink = Arc::new(InfluxDbSink::from_config(&config(port)).unwrap());
        let registry = Arc::new(InMemoryRegistry::new());
        registry.increment("counter.batch.r1.itemsRead", 42);

        let exporter = ScheduledExporter::connect(
            registry,
            sink,
            ExporterOptions {
                environment: "prod".to_string(),
                interval: Duration::from_secs(60),
            },
        )
        .await
        .unwrap();
        assert_eq!(exporter.export().await, ExportOutcome::Sent(1));

        let (ping_line, _) = requests.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(ping_line.starts_with("GET /ping"));

        let (write_line, body) = requests.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(write_line.starts_with("POST /write?db=batch&precision=ms"));
        assert!(body.starts_with("prod.counter.batch.r1.itemsRead value=42i "));
    }
}
