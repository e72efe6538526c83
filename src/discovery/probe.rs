//! Liveness probes.
//!
//! A probe answers one question: does this address respond? Two real
//! implementations exist, one shelling out to the platform `ping` and one
//! sending ICMP echo directly (needs raw-socket privileges on most systems).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Reports whether a host is reachable.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// `true` if `address` answered within `timeout`. Never errors.
    async fn probe(&self, address: Ipv4Addr, timeout: Duration) -> bool;
}

/// Available probe implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Run the system `ping` utility once per address.
    #[default]
    Ping,
    /// Send ICMP echo from this process.
    Icmp,
}

impl ProbeKind {
    pub fn build(self) -> Arc<dyn LivenessProbe> {
        match self {
            Self::Ping => Arc::new(ShellPingProbe::new()),
            Self::Icmp => Arc::new(IcmpProbe::new()),
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ping => write!(f, "ping"),
            Self::Icmp => write!(f, "icmp"),
        }
    }
}

/// Probe that runs `ping` with a single echo request.
#[derive(Debug, Clone)]
pub struct ShellPingProbe {
    program: String,
}

impl ShellPingProbe {
    pub fn new() -> Self {
        Self::with_program("ping")
    }

    /// Use a different executable with ping-compatible arguments.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ShellPingProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments for one echo request with the given wait.
pub fn ping_args(address: Ipv4Addr, wait: Duration) -> Vec<String> {
    let millis = wait.as_millis().max(1);

    #[cfg(target_os = "windows")]
    let args = vec![
        "-n".to_string(),
        "1".to_string(),
        "-w".to_string(),
        millis.to_string(),
    ];

    // BSD ping takes -W in milliseconds.
    #[cfg(target_os = "macos")]
    let args = vec![
        "-c".to_string(),
        "1".to_string(),
        "-W".to_string(),
        millis.to_string(),
    ];

    // iputils ping takes -W in whole seconds.
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let args = vec![
        "-c".to_string(),
        "1".to_string(),
        "-W".to_string(),
        millis.div_ceil(1000).to_string(),
    ];

    let mut args = args;
    args.push(address.to_string());
    args
}

#[async_trait]
impl LivenessProbe for ShellPingProbe {
    async fn probe(&self, address: Ipv4Addr, wait: Duration) -> bool {
        let mut child = match Command::new(&self.program)
            .args(ping_args(address, wait))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(%address, error = %e, program = %self.program, "failed to spawn ping");
                return false;
            }
        };

        // Give the utility a little longer than its own deadline.
        match timeout(wait + Duration::from_secs(1), child.wait()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::debug!(%address, error = %e, "ping did not complete");
                false
            }
            Err(_) => {
                tracing::debug!(%address, "ping overran its deadline");
                false
            }
        }
    }
}

/// Probe that sends one ICMP echo request itself.
#[derive(Debug, Clone)]
pub struct IcmpProbe {
    payload: Vec<u8>,
}

impl IcmpProbe {
    pub fn new() -> Self {
        Self {
            payload: vec![0; 56],
        }
    }
}

impl Default for IcmpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LivenessProbe for IcmpProbe {
    async fn probe(&self, address: Ipv4Addr, wait: Duration) -> bool {
        match timeout(wait, surge_ping::ping(IpAddr::V4(address), &self.payload)).await {
            Ok(Ok((_packet, rtt))) => {
                tracing::trace!(%address, ?rtt, "echo reply");
                true
            }
            Ok(Err(e)) => {
                tracing::debug!(%address, error = %e, "icmp echo failed");
                false
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_args_single_echo() {
        let args = ping_args(Ipv4Addr::new(10, 0, 0, 1), Duration::from_millis(1500));
        assert_eq!(args.last().map(String::as_str), Some("10.0.0.1"));
        assert!(args.contains(&"1".to_string()));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn test_ping_args_rounds_wait_up_to_seconds() {
        let args = ping_args(Ipv4Addr::new(10, 0, 0, 1), Duration::from_millis(1500));
        assert_eq!(args, vec!["-c", "1", "-W", "2", "10.0.0.1"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_not_alive() {
        let probe = ShellPingProbe::with_program("netsweep-no-such-ping-binary");
        assert!(!probe.probe(Ipv4Addr::LOCALHOST, Duration::from_millis(100)).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_decides_liveness() {
        // `true` and `false` ignore their arguments.
        let yes = ShellPingProbe::with_program("true");
        let no = ShellPingProbe::with_program("false");
        assert!(yes.probe(Ipv4Addr::new(10, 0, 0, 1), Duration::from_millis(100)).await);
        assert!(!no.probe(Ipv4Addr::new(10, 0, 0, 1), Duration::from_millis(100)).await);
    }

    #[test]
    fn test_probe_kind_display() {
        assert_eq!(ProbeKind::Ping.to_string(), "ping");
        assert_eq!(ProbeKind::default(), ProbeKind::Ping);
    }
}
