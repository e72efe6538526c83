//! Progress reporting for concurrent host scans.
//!
//! Scanners only ever talk to a [`ProgressReporter`]; how the progress ends up
//! on screen is the reporter's business. Every implementation serializes its
//! own output, so status lines and bar redraws from many tasks never garble
//! each other.

mod bars;
mod log_writer;
mod terminal;

pub use bars::BarsReporter;
pub use log_writer::ReporterLog;
pub use terminal::{LineReporter, TerminalReporter};

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Mutex;

/// Width of the bar between the brackets.
pub const BAR_WIDTH: usize = 50;

/// Label shown after the percentage.
pub const SCAN_ACTION: &str = "Scanning ports...";

/// Sink for per-host scan progress and status lines.
pub trait ProgressReporter: Send + Sync {
    /// Hand out the next display row (1-based) in the managed region.
    fn allocate_row(&self) -> u16;

    /// Redraw the bar for `host` on `row`.
    ///
    /// `completed == total` marks the host as done.
    fn update(&self, host: Ipv4Addr, completed: u64, total: u64, row: u16);

    /// Print a status line without disturbing any bar.
    fn message(&self, line: &str);

    /// Leave the cursor below everything this reporter drew.
    fn finish(&self) {}
}

/// How progress is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// One fixed terminal row per host, redrawn in place.
    #[default]
    Rows,
    /// indicatif multi-bar display.
    Bars,
    /// Status lines only, no bars.
    None,
}

impl std::fmt::Display for ProgressMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rows => write!(f, "rows"),
            Self::Bars => write!(f, "bars"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Fraction done, treating an empty workload as finished.
pub fn fraction(completed: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        (completed.min(total) as f64) / (total as f64)
    }
}

/// Render `[host] [====>    ] NN% Scanning ports...`.
pub fn render_bar(host: Ipv4Addr, completed: u64, total: u64) -> String {
    let progress = fraction(completed, total);
    let pos = (BAR_WIDTH as f64 * progress) as usize;

    let bar: String = (0..BAR_WIDTH)
        .map(|i| match i.cmp(&pos) {
            std::cmp::Ordering::Less => '=',
            std::cmp::Ordering::Equal => '>',
            std::cmp::Ordering::Greater => ' ',
        })
        .collect();

    format!(
        "[{}] [{}] {}% {}",
        host,
        bar,
        (progress * 100.0) as u32,
        SCAN_ACTION
    )
}

/// One recorded `update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub host: Ipv4Addr,
    pub completed: u64,
    pub total: u64,
    pub row: u16,
}

/// Reporter that keeps every call for later inspection.
#[derive(Debug)]
pub struct RecordingReporter {
    next_row: AtomicU16,
    events: Mutex<Vec<ProgressEvent>>,
    messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self {
            next_row: AtomicU16::new(1),
            events: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// All updates in call order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Updates for one host in call order.
    pub fn events_for(&self, host: Ipv4Addr) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.host == host)
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for RecordingReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for RecordingReporter {
    fn allocate_row(&self) -> u16 {
        self.next_row.fetch_add(1, Ordering::SeqCst)
    }

    fn update(&self, host: Ipv4Addr, completed: u64, total: u64, row: u16) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ProgressEvent {
                host,
                completed,
                total,
                row,
            });
    }

    fn message(&self, line: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);

    #[test]
    fn test_render_bar_halfway() {
        let line = render_bar(HOST, 50, 100);
        let expected_bar = format!("{}>{}", "=".repeat(25), " ".repeat(24));
        assert_eq!(
            line,
            format!("[10.0.0.5] [{}] 50% Scanning ports...", expected_bar)
        );
    }

    #[test]
    fn test_render_bar_complete_and_empty() {
        let done = render_bar(HOST, 10, 10);
        assert!(done.contains(&"=".repeat(BAR_WIDTH)));
        assert!(done.ends_with("100% Scanning ports..."));

        let start = render_bar(HOST, 0, 10);
        assert!(start.contains(&format!("[>{}]", " ".repeat(BAR_WIDTH - 1))));
        assert!(start.contains(" 0% "));
    }

    #[test]
    fn test_zero_total_renders_finished() {
        assert_eq!(fraction(0, 0), 1.0);
        assert!(render_bar(HOST, 0, 0).contains("100%"));
    }

    #[test]
    fn test_recording_reporter_rows_increase() {
        let reporter = RecordingReporter::new();
        assert_eq!(reporter.allocate_row(), 1);
        assert_eq!(reporter.allocate_row(), 2);

        reporter.update(HOST, 1, 2, 2);
        reporter.message("hello");
        assert_eq!(reporter.events_for(HOST).len(), 1);
        assert_eq!(reporter.messages(), vec!["hello".to_string()]);
    }
}
