//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::orchestrator::{HostStatus, RunSummary};
use console::style;
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Print the summary in human-readable plain text format.
pub fn print_plain(summary: &RunSummary) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_plain(&mut out, summary)
}

/// Write the summary table to `out`.
pub fn write_plain(out: &mut impl Write, summary: &RunSummary) -> io::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(
        out,
        "                    {} Sweep Results",
        style("netsweep").cyan().bold()
    )?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    writeln!(out, "  {} {}", style("Subnet:").bold(), summary.subnet)?;
    writeln!(out, "  {} {}", style("Ports:").bold(), summary.ports)?;
    writeln!(
        out,
        "  {} {}",
        style("Started:").bold(),
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "  {} {} hosts swept in {:.2}s",
        style("Statistics:").bold(),
        summary.hosts.len(),
        summary.duration_ms as f64 / 1000.0
    )?;
    writeln!(
        out,
        "               {} open ports, {} failed hosts",
        style(summary.open_port_count()).green().bold(),
        style(summary.failed_hosts()).red()
    )?;
    writeln!(out)?;

    if summary.hosts.is_empty() {
        writeln!(out, "  {}", style("No live hosts found.").dim())?;
    } else {
        writeln!(out, "  {}", style(THIN_RULE).dim())?;
        writeln!(
            out,
            "  {:<15}  {:^9}  {:>7}  {:>7}  {}",
            style("HOST").bold(),
            style("STATUS").bold(),
            style("SCANNED").bold(),
            style("SKIPPED").bold(),
            style("OPEN").bold()
        )?;
        writeln!(out, "  {}", style(THIN_RULE).dim())?;

        for outcome in &summary.hosts {
            match (&outcome.status, &outcome.report) {
                (HostStatus::Completed, Some(report)) => {
                    let open = if report.open_ports.is_empty() {
                        "-".to_string()
                    } else {
                        truncate_string(&join_ports(&report.open_ports), 30)
                    };
                    writeln!(
                        out,
                        "  {:<15}  {:^9}  {:>7}  {:>7}  {}",
                        outcome.host.to_string(),
                        style("done").green(),
                        report.scanned,
                        report.already_recorded,
                        style(open).green().bold()
                    )?;
                }
                (HostStatus::Failed { reason }, _) => {
                    writeln!(
                        out,
                        "  {:<15}  {:^9}  {:>7}  {:>7}  {}",
                        outcome.host.to_string(),
                        style("failed").red().bold(),
                        "-",
                        "-",
                        style(truncate_string(reason, 30)).dim()
                    )?;
                }
                (HostStatus::Completed, None) => {
                    writeln!(out, "  {:<15}  {:^9}", outcome.host.to_string(), "done")?;
                }
            }
        }

        writeln!(out, "  {}", style(THIN_RULE).dim())?;
    }

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

fn join_ports(ports: &[u16]) -> String {
    ports
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Truncate a string to a maximum length, adding ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
