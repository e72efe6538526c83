//! Top-level sweep driver.
//!
//! Discovery runs once; every live host then gets its own [`PortScanner`]
//! task. All tasks share one [`ScanPool`], one checkpoint store and one
//! progress reporter. A failing host is reported and left behind while its
//! siblings carry on.

use crate::checkpoint::CheckpointStore;
use crate::config::AppSettings;
use crate::discovery::{local_subnet, DiscoveryEngine, LivenessProbe};
use crate::error::{ConfigResult, DiscoveryResult};
use crate::progress::ProgressReporter;
use crate::scanner::{Connector, HostReport, PortScanner, ScanPool};
use crate::types::{PortRange, Subnet};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Resolved parameters for one sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Subnet to sweep; detected from the local interface when `None`.
    pub subnet: Option<Subnet>,
    /// Interface to take the local address from.
    pub interface: Option<String>,
    pub ports: PortRange,
    /// Pool capacity shared by every host.
    pub concurrency: usize,
    pub connect_timeout: Duration,
    pub ping_timeout: Duration,
    pub discovery_concurrency: usize,
    pub output_dir: PathBuf,
}

impl SweepConfig {
    pub fn from_settings(settings: &AppSettings) -> ConfigResult<Self> {
        settings.validate()?;
        Ok(Self {
            subnet: None,
            interface: None,
            ports: settings.port_range()?,
            concurrency: settings.concurrency,
            connect_timeout: Duration::from_millis(settings.connect_timeout_ms),
            ping_timeout: Duration::from_millis(settings.ping_timeout_ms),
            discovery_concurrency: settings.discovery_concurrency,
            output_dir: settings.output_dir.clone(),
        })
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        // Defaults always validate.
        Self::from_settings(&AppSettings::default()).unwrap_or_else(|_| Self {
            subnet: None,
            interface: None,
            ports: PortRange::full(),
            concurrency: 500,
            connect_timeout: Duration::from_secs(1),
            ping_timeout: Duration::from_secs(1),
            discovery_concurrency: 64,
            output_dir: PathBuf::from("."),
        })
    }
}

/// How a host's scan ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HostStatus {
    Completed,
    Failed { reason: String },
}

/// Result for one discovered host.
#[derive(Debug, Clone, Serialize)]
pub struct HostOutcome {
    pub host: Ipv4Addr,
    pub row: u16,
    #[serde(flatten)]
    pub status: HostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<HostReport>,
}

/// Everything a sweep produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub subnet: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub concurrency: usize,
    pub ports: String,
    pub hosts: Vec<HostOutcome>,
}

impl RunSummary {
    pub fn failed_hosts(&self) -> usize {
        self.hosts
            .iter()
            .filter(|h| matches!(h.status, HostStatus::Failed { .. }))
            .count()
    }

    pub fn open_port_count(&self) -> usize {
        self.hosts
            .iter()
            .filter_map(|h| h.report.as_ref())
            .map(|r| r.open_ports.len())
            .sum()
    }
}

/// Runs discovery and one port scan per live host.
pub struct ScanOrchestrator {
    config: SweepConfig,
    probe: Arc<dyn LivenessProbe>,
    reporter: Arc<dyn ProgressReporter>,
    scanner: Arc<PortScanner>,
}

impl ScanOrchestrator {
    pub fn new(
        config: SweepConfig,
        probe: Arc<dyn LivenessProbe>,
        connector: Arc<dyn Connector>,
        reporter: Arc<dyn ProgressReporter>,
        store: Arc<CheckpointStore>,
    ) -> Self {
        let pool = ScanPool::new(config.concurrency);
        let scanner = Arc::new(PortScanner::new(
            connector,
            store,
            Arc::clone(&reporter),
            pool,
            config.connect_timeout,
        ));

        Self {
            config,
            probe,
            reporter,
            scanner,
        }
    }

    /// The configured subnet, or the /24 around the local address.
    pub fn resolve_subnet(&self) -> DiscoveryResult<Subnet> {
        match self.config.subnet {
            Some(subnet) => Ok(subnet),
            None => local_subnet(self.config.interface.as_deref()),
        }
    }

    /// Resolve the subnet and sweep it.
    ///
    /// Only a failure to determine the subnet is an error; host failures are
    /// reported in the summary.
    pub async fn run(&self) -> DiscoveryResult<RunSummary> {
        let subnet = self.resolve_subnet()?;
        Ok(self.sweep(subnet).await)
    }

    /// Discover live hosts in `subnet` and scan each of them.
    pub async fn sweep(&self, subnet: Subnet) -> RunSummary {
        let started_at = Utc::now();
        let start = Instant::now();

        self.reporter.message(&format!("Scanning subnet: {}", subnet));
        self.reporter.message(&format!(
            "Using {} concurrent connections for scanning.",
            self.config.concurrency
        ));

        let engine = DiscoveryEngine::new(
            Arc::clone(&self.probe),
            self.config.ping_timeout,
            self.config.discovery_concurrency,
        );
        let reporter = &self.reporter;
        let hosts = engine
            .discover(subnet, |host| reporter.message(&format!("Found host: {}", host)))
            .await;

        if hosts.is_empty() {
            self.reporter
                .message(&format!("No live hosts found on {}.", subnet));
        }

        let mut tasks = Vec::with_capacity(hosts.len());
        for host in hosts {
            self.reporter.message(&format!("Scanning IP: {}", host));
            let row = self.reporter.allocate_row();
            let scanner = Arc::clone(&self.scanner);
            let ports = self.config.ports;
            let handle = tokio::spawn(async move { scanner.scan_host(host, ports, row).await });
            tasks.push((host, row, handle));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (host, row, handle) in tasks {
            let (status, report) = match handle.await {
                Ok(Ok(report)) => (HostStatus::Completed, Some(report)),
                Ok(Err(e)) => {
                    tracing::debug!(%host, error = ?e, "host scan aborted");
                    self.reporter
                        .message(&format!("Scanning aborted for IP {}: {}", host, e));
                    (
                        HostStatus::Failed {
                            reason: e.to_string(),
                        },
                        None,
                    )
                }
                Err(e) => {
                    let reason = format!("scan task failed: {}", e);
                    self.reporter
                        .message(&format!("Scanning aborted for IP {}: {}", host, reason));
                    (HostStatus::Failed { reason }, None)
                }
            };
            outcomes.push(HostOutcome {
                host,
                row,
                status,
                report,
            });
        }

        self.reporter.message("Scanning completed for all devices.");
        self.reporter.finish();

        RunSummary {
            subnet: subnet.to_string(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            concurrency: self.config.concurrency,
            ports: self.config.ports.to_string(),
            hosts: outcomes,
        }
    }
}
