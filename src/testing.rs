//! Scripted connectors and probes for unit tests.

use crate::discovery::LivenessProbe;
use crate::error::{ScanError, ScanResult};
use crate::scanner::Connector;
use async_trait::async_trait;
use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Verdict = dyn Fn(u16) -> ScanResult<()> + Send + Sync;

/// Connector whose answer is computed from the port number.
pub struct FnConnector {
    verdict: Box<Verdict>,
    jitter: bool,
    attempted: Mutex<Vec<SocketAddrV4>>,
}

impl FnConnector {
    pub fn new(verdict: impl Fn(u16) -> ScanResult<()> + Send + Sync + 'static) -> Self {
        Self {
            verdict: Box::new(verdict),
            jitter: false,
            attempted: Mutex::new(Vec::new()),
        }
    }

    /// Accept on `open`, refuse everywhere else.
    pub fn open_ports(open: &[u16]) -> Self {
        let open: HashSet<u16> = open.iter().copied().collect();
        Self::new(move |port| {
            if open.contains(&port) {
                Ok(())
            } else {
                Err(ScanError::ConnectionRefused)
            }
        })
    }

    /// Like `open_ports`, but answers arrive out of port order.
    pub fn with_jitter(open: &[u16]) -> Self {
        Self {
            jitter: true,
            ..Self::open_ports(open)
        }
    }

    /// Ports attempted so far, in call order.
    pub fn attempted(&self) -> Vec<u16> {
        self.attempted
            .lock()
            .unwrap()
            .iter()
            .map(|addr| addr.port())
            .collect()
    }

    /// Full addresses attempted so far.
    pub fn targets(&self) -> Vec<SocketAddrV4> {
        self.attempted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for FnConnector {
    async fn connect(&self, target: SocketAddrV4, _timeout: Duration) -> ScanResult<()> {
        self.attempted.lock().unwrap().push(target);
        if self.jitter {
            let delay = (u64::from(target.port()) * 7) % 5;
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        (self.verdict)(target.port())
    }
}

/// Connector that measures how many attempts overlap.
pub struct GaugeConnector {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl GaugeConnector {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for GaugeConnector {
    async fn connect(&self, _target: SocketAddrV4, _timeout: Duration) -> ScanResult<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Err(ScanError::Timeout)
    }
}

/// Liveness probe answering from a fixed set.
pub struct StaticProbe {
    alive: HashSet<Ipv4Addr>,
    probed: Mutex<Vec<Ipv4Addr>>,
}

impl StaticProbe {
    pub fn new(alive: &[Ipv4Addr]) -> Self {
        Self {
            alive: alive.iter().copied().collect(),
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn probed(&self) -> Vec<Ipv4Addr> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl LivenessProbe for StaticProbe {
    async fn probe(&self, address: Ipv4Addr, _timeout: Duration) -> bool {
        self.probed.lock().unwrap().push(address);
        self.alive.contains(&address)
    }
}
