use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger::{self, LogTag};
use crate::platform::TradingPlatform;

use super::orchestrator::SessionOrchestrator;

/// Interval between periodic health checks
const CHECK_INTERVAL_SECS: u64 = 3600;

/// Result of one health pass
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub platform_connected: bool,
    pub data_dir_writable: bool,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn healthy(&self) -> bool {
        self.platform_connected && self.data_dir_writable
    }
}

/// Periodic system health checks: broker connectivity and data directory
/// writability
pub struct HealthMonitor {
    platform: Arc<dyn TradingPlatform>,
    data_dir: PathBuf,
}

impl HealthMonitor {
    pub fn new(platform: Arc<dyn TradingPlatform>, data_dir: PathBuf) -> Self {
        Self { platform, data_dir }
    }

    /// Run one pass of all checks
    pub async fn run_checks(&self) -> HealthReport {
        let platform_connected = self.platform.is_connected().await;
        let data_dir_writable = self.probe_data_dir();

        let report = HealthReport {
            platform_connected,
            data_dir_writable,
            checked_at: Utc::now(),
        };

        if report.healthy() {
            logger::debug(LogTag::Health, "Health check passed");
        } else {
            logger::warning(
                LogTag::Health,
                &format!(
                    "Health check failed (platform: {}, data dir: {})",
                    platform_connected, data_dir_writable
                ),
            );
        }
        report
    }

    fn probe_data_dir(&self) -> bool {
        let probe = self.data_dir.join(".health_probe");
        match std::fs::write(&probe, b"ok") {
            Ok(()) => {
                let _ = std::fs::remove_file(&probe);
                true
            }
            Err(e) => {
                logger::warning(
                    LogTag::Health,
                    &format!("Data dir probe failed at {}: {}", probe.display(), e),
                );
                false
            }
        }
    }

    /// Spawn the hourly check loop; stops when `shutdown` is notified.
    /// Losing the platform connection halts trading through the orchestrator.
    pub fn spawn(
        self: Arc<Self>,
        shutdown: Arc<Notify>,
        orchestrator: Arc<SessionOrchestrator>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            logger::info(LogTag::Health, "❤️ Health monitor started");
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        logger::info(LogTag::Health, "Health monitor stopping");
                        break;
                    }
                    _ = tokio::time::sleep(std::time::Duration::from_secs(CHECK_INTERVAL_SECS)) => {
                        let report = self.run_checks().await;
                        if !report.platform_connected && !orchestrator.is_halted() {
                            orchestrator.halt("platform connection lost").await;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PaperPlatform;

    #[tokio::test]
    async fn test_checks_pass_with_writable_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let platform = Arc::new(PaperPlatform::new(5000.0, 21200.0, 0.25));
        let monitor = HealthMonitor::new(platform, dir.path().to_path_buf());

        let report = monitor.run_checks().await;
        assert!(report.healthy());
    }

    #[tokio::test]
    async fn test_missing_dir_fails_probe() {
        let platform = Arc::new(PaperPlatform::new(5000.0, 21200.0, 0.25));
        let monitor = HealthMonitor::new(
            platform,
            PathBuf::from("/nonexistent/scoutbot-health-test"),
        );

        let report = monitor.run_checks().await;
        assert!(!report.data_dir_writable);
        assert!(!report.healthy());
    }
}
