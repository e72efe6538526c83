//! Host discovery across a /24.
//!
//! Every candidate address is probed once, with a bounded number of probes
//! in flight. Hosts are returned in the order their probes answered, which is
//! arbitrary; nothing downstream depends on it beyond row assignment.

pub mod local;
pub mod probe;

pub use local::{local_address, local_subnet};
pub use probe::{IcmpProbe, LivenessProbe, ProbeKind, ShellPingProbe};

use crate::types::Subnet;
use futures::stream::{self, StreamExt};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Finds responsive hosts with a [`LivenessProbe`].
pub struct DiscoveryEngine {
    probe: Arc<dyn LivenessProbe>,
    timeout: Duration,
    concurrency: usize,
}

impl DiscoveryEngine {
    pub fn new(probe: Arc<dyn LivenessProbe>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            probe,
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Probe `.1`-`.254` of `subnet`, calling `on_alive` as each host answers.
    ///
    /// Failed or overdue probes simply leave the host out; nothing is retried.
    pub async fn discover(&self, subnet: Subnet, mut on_alive: impl FnMut(Ipv4Addr)) -> Vec<Ipv4Addr> {
        let probe = &self.probe;
        let wait = self.timeout;
        // Backstop for probes that ignore their own deadline.
        let deadline = wait * 2 + Duration::from_secs(1);

        let mut probes = stream::iter(subnet.hosts())
            .map(|address| async move {
                let alive = timeout(deadline, probe.probe(address, wait))
                    .await
                    .unwrap_or(false);
                (address, alive)
            })
            .buffer_unordered(self.concurrency);

        let mut alive = Vec::new();
        while let Some((address, responded)) = probes.next().await {
            if responded {
                tracing::info!(%address, "host is alive");
                on_alive(address);
                alive.push(address);
            } else {
                tracing::trace!(%address, "no response");
            }
        }

        tracing::info!(%subnet, found = alive.len(), "discovery finished");
        alive
    }
}
