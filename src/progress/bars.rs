//! indicatif-backed progress display.

use super::{ProgressReporter, BAR_WIDTH, SCAN_ACTION};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Mutex;

/// One indicatif bar per host, stacked in row order.
pub struct BarsReporter {
    multi: MultiProgress,
    bars: Mutex<BTreeMap<u16, ProgressBar>>,
    next_row: AtomicU16,
    style: ProgressStyle,
}

impl BarsReporter {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template(&format!(
            "[{{prefix}}] [{{bar:{}}}] {{percent}}% {{msg}}",
            BAR_WIDTH
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(BTreeMap::new()),
            next_row: AtomicU16::new(1),
            style,
        }
    }
}

impl Default for BarsReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarsReporter {
    fn allocate_row(&self) -> u16 {
        self.next_row.fetch_add(1, Ordering::SeqCst)
    }

    fn update(&self, host: Ipv4Addr, completed: u64, total: u64, row: u16) {
        let mut bars = self.bars.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if !bars.contains_key(&row) {
            // Keep the on-screen order equal to row order even when a later
            // row reports first.
            let index = bars.range(..row).count();
            let bar = self.multi.insert(index, ProgressBar::new(total));
            bar.set_style(self.style.clone());
            bar.set_prefix(host.to_string());
            bar.set_message(SCAN_ACTION);
            bars.insert(row, bar);
        }

        if let Some(bar) = bars.get(&row) {
            bar.set_length(total);
            bar.set_position(completed.min(total));
            if completed >= total {
                bar.finish();
            }
        }
    }

    fn message(&self, line: &str) {
        let result = {
            let bars = self.bars.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if bars.is_empty() {
                println!("{}", line);
                Ok(())
            } else {
                self.multi.println(line)
            }
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "progress println failed");
        }
    }

    fn finish(&self) {
        let bars = self.bars.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for bar in bars.values() {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
    }
}
