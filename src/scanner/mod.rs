//! Scanner module - per-host port sweeps under a shared connection pool.
//!
//! A [`PortScanner`] walks one host's port range, skips everything the
//! checkpoint already lists, and pushes the rest through a [`ScanPool`] whose
//! single semaphore caps in-flight connects across every host at once.

pub mod limits;
pub mod tcp;

pub use tcp::{Connector, TcpConnector};

use crate::checkpoint::CheckpointStore;
use crate::error::{ScanError, ScanResult};
use crate::progress::ProgressReporter;
use crate::types::{Port, PortRange, PortState};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, SemaphorePermit};

/// Global bound on concurrent connection attempts.
///
/// Cloning shares the same permits.
#[derive(Debug, Clone)]
pub struct ScanPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ScanPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    async fn acquire(&self) -> ScanResult<SemaphorePermit<'_>> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| ScanError::ResourceExhausted("scan pool closed".to_string()))
    }
}

/// Outcome of one host's sweep.
#[derive(Debug, Clone, Serialize)]
pub struct HostReport {
    pub host: Ipv4Addr,
    pub range: String,
    /// Ports skipped because an earlier run recorded them.
    pub already_recorded: usize,
    /// Ports tested in this run.
    pub scanned: u64,
    /// Ports that turned out open in this run.
    pub newly_open: Vec<u16>,
    /// Every port known open for the host, old and new.
    pub open_ports: Vec<u16>,
    pub duration_ms: u64,
}

/// Sweeps the ports of a single host.
pub struct PortScanner {
    connector: Arc<dyn Connector>,
    store: Arc<CheckpointStore>,
    reporter: Arc<dyn ProgressReporter>,
    pool: ScanPool,
    timeout: Duration,
}

impl PortScanner {
    pub fn new(
        connector: Arc<dyn Connector>,
        store: Arc<CheckpointStore>,
        reporter: Arc<dyn ProgressReporter>,
        pool: ScanPool,
        timeout: Duration,
    ) -> Self {
        Self {
            connector,
            store,
            reporter,
            pool,
            timeout,
        }
    }

    /// Test every port in `range` not yet recorded for `host`.
    ///
    /// Per-port failures are recorded as closed. Checkpoint I/O errors and
    /// local resource exhaustion abort this host only.
    pub async fn scan_host(&self, host: Ipv4Addr, range: PortRange, row: u16) -> ScanResult<HostReport> {
        let start_time = Instant::now();
        let checkpoint = self.store.load(host).await?;

        let pending: Vec<Port> = range.iter().filter(|p| !checkpoint.contains(*p)).collect();
        let total = pending.len() as u64;
        let already_recorded = range.len() - pending.len();

        tracing::info!(%host, %range, pending = total, already_recorded, "starting host scan");

        if total == 0 {
            self.reporter.update(host, 0, 0, row);
        }

        let pool = &self.pool;
        let connector = &self.connector;
        let limit = self.timeout;

        let mut attempts = stream::iter(pending)
            .map(|port| async move {
                let outcome = match pool.acquire().await {
                    Ok(_permit) => {
                        connector
                            .connect(SocketAddrV4::new(host, port.as_u16()), limit)
                            .await
                    }
                    Err(e) => Err(e),
                };
                (port, outcome)
            })
            .buffer_unordered(pool.capacity());

        let mut completed = 0u64;
        let mut newly_open = Vec::new();

        while let Some((port, outcome)) = attempts.next().await {
            let state = match outcome {
                Ok(()) => PortState::Open,
                Err(e) if e.is_host_fatal() => {
                    tracing::debug!(%host, %port, error = %e, "aborting host scan");
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(%host, %port, error = %e, "connect failed");
                    PortState::Closed
                }
            };

            self.store.record(host, port, state).await?;
            if state.is_open() {
                newly_open.push(port.as_u16());
            }

            completed += 1;
            self.reporter.update(host, completed, total, row);
        }

        self.reporter.message(&format!(
            "Port scanning completed for range {} to {} on IP {}",
            range.start(),
            range.end(),
            host
        ));

        let mut open_ports: Vec<u16> = checkpoint
            .open_ports()
            .into_iter()
            .map(Port::as_u16)
            .chain(newly_open.iter().copied())
            .collect();
        open_ports.sort_unstable();
        newly_open.sort_unstable();

        Ok(HostReport {
            host,
            range: range.to_string(),
            already_recorded,
            scanned: completed,
            newly_open,
            open_ports,
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}
