use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, info};

use crate::exporter::ExporterHandle;

/// 关闭超时时间（秒），需覆盖一次进行中的导出
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Wait for Ctrl+C, then stop the export schedule.
///
/// A tick in flight is allowed to finish; the wait is bounded.
pub async fn listen_for_shutdown(handle: ExporterHandle) {
    crate::system::signal::wait_for_shutdown().await;

    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), handle.shutdown()).await {
        Ok(()) => info!("Exporter stopped"),
        Err(_) => error!(
            "Exporter did not stop within {} seconds, exiting anyway",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
