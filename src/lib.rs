//! # netsweep - Resumable LAN Host and Port Sweep
//!
//! netsweep finds the live hosts on a /24 and checks every TCP port on each
//! of them, writing results to plain-text checkpoint files as it goes so an
//! interrupted sweep picks up where it stopped.
//!
//! ## Features
//!
//! - **Host Discovery**: Concurrent liveness probes via the system `ping` or native ICMP
//! - **Bounded Concurrency**: One connection pool shared by every host, clamped to the descriptor limit
//! - **Checkpoint/Resume**: `<host>.txt` and `<host>_Open.txt` per host, append-only
//! - **Live Progress**: One bar per host on a stable terminal row
//! - **Run Summary**: Plain text or JSON
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use netsweep::checkpoint::CheckpointStore;
//! use netsweep::discovery::ShellPingProbe;
//! use netsweep::orchestrator::{ScanOrchestrator, SweepConfig};
//! use netsweep::progress::TerminalReporter;
//! use netsweep::scanner::TcpConnector;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SweepConfig::default();
//!     let store = Arc::new(CheckpointStore::new(config.output_dir.clone())?);
//!     let orchestrator = ScanOrchestrator::new(
//!         config,
//!         Arc::new(ShellPingProbe::new()),
//!         Arc::new(TcpConnector::new()),
//!         Arc::new(TerminalReporter::new()),
//!         store,
//!     );
//!
//!     let summary = orchestrator.run().await?;
//!     println!("{} hosts swept", summary.hosts.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Port, port range and /24 subnet newtypes
//! - [`discovery`] - Local subnet detection and liveness probing
//! - [`scanner`] - Per-host TCP sweeps under a shared connection pool
//! - [`checkpoint`] - Durable per-host results and resume
//! - [`progress`] - Progress reporters for terminals, pipes and tests
//! - [`orchestrator`] - Ties discovery and per-host scans together
//! - [`config`] - Settings file handling
//! - [`output`] - Run summary formatting
//! - [`error`] - Error types

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use error::{CheckpointError, ConfigError, DiscoveryError, ScanError};
pub use orchestrator::{RunSummary, ScanOrchestrator, SweepConfig};
pub use types::{Port, PortRange, PortState, Subnet};
