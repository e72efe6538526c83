//! Command-line interface definitions for netsweep.
//!
//! Uses `clap` derive macros for declarative argument parsing. Every flag is
//! optional; unset flags fall back to the settings file, then to defaults.

use crate::config::AppSettings;
use crate::discovery::ProbeKind;
use crate::error::ConfigResult;
use crate::orchestrator::SweepConfig;
use crate::output::SummaryFormat;
use crate::progress::ProgressMode;
use crate::types::Subnet;
use clap::Parser;
use std::path::PathBuf;

/// Discover live hosts on the local /24 and check every TCP port on each.
///
/// Results are appended to `<host>.txt` and `<host>_Open.txt` in the output
/// directory. Running again resumes where the last run stopped.
#[derive(Parser, Debug, Default)]
#[command(name = "netsweep")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resumable LAN host and port sweep", long_about = None)]
pub struct Args {
    /// Subnet to sweep instead of the local one
    ///
    /// Examples:
    ///   192.168.1          First three octets
    ///   192.168.1.0/24     CIDR notation
    ///   192.168.1.57       Any address inside the /24
    #[arg(short = 's', long, value_name = "SUBNET")]
    pub subnet: Option<Subnet>,

    /// Interface whose address decides the local subnet
    #[arg(short = 'i', long, value_name = "NAME")]
    pub interface: Option<String>,

    /// Ports to check on each host (e.g. "1-1024", "22")
    #[arg(short, long, value_name = "START-END")]
    pub ports: Option<String>,

    /// Maximum concurrent connection attempts across all hosts
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Connection timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Liveness probe timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub ping_timeout: Option<u64>,

    /// Liveness probes in flight at once
    #[arg(long)]
    pub discovery_concurrency: Option<usize>,

    /// How hosts are probed for liveness
    #[arg(long, value_enum)]
    pub probe: Option<ProbeKind>,

    /// Progress display
    #[arg(long, value_enum)]
    pub progress: Option<ProgressMode>,

    /// Directory for checkpoint files
    #[arg(short, long, value_name = "DIR", env = "NETSWEEP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Format of the summary printed at the end
    #[arg(long, value_enum, default_value_t = SummaryFormat::Plain)]
    pub summary: SummaryFormat,

    /// Path to a settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the merged settings to the settings file and exit
    #[arg(long)]
    pub save_settings: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Load the settings file named by `--config`, or the default one.
    pub fn load_settings(&self) -> ConfigResult<AppSettings> {
        match &self.config {
            Some(path) => AppSettings::load_from(path),
            None => AppSettings::load(),
        }
    }

    /// Overlay the flags that were given onto `settings`.
    pub fn apply(&self, mut settings: AppSettings) -> ConfigResult<AppSettings> {
        if let Some(ports) = &self.ports {
            settings.ports = ports.clone();
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            settings.connect_timeout_ms = timeout;
        }
        if let Some(timeout) = self.ping_timeout {
            settings.ping_timeout_ms = timeout;
        }
        if let Some(concurrency) = self.discovery_concurrency {
            settings.discovery_concurrency = concurrency;
        }
        if let Some(probe) = self.probe {
            settings.probe = probe;
        }
        if let Some(progress) = self.progress {
            settings.progress = progress;
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Persist `settings` to the `--config` file, or the default one.
    pub fn save(&self, settings: &AppSettings) -> ConfigResult<PathBuf> {
        match &self.config {
            Some(path) => {
                settings.save_to(path)?;
                Ok(path.clone())
            }
            None => settings.save(),
        }
    }

    /// Build the sweep parameters from merged settings plus the
    /// subnet and interface flags.
    pub fn sweep_config(&self, settings: &AppSettings) -> ConfigResult<SweepConfig> {
        let mut config = SweepConfig::from_settings(settings)?;
        config.subnet = self.subnet;
        config.interface = self.interface.clone();
        Ok(config)
    }
}
