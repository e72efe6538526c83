//! Output formatting module.
//!
//! Prints the end-of-run summary as plain text or JSON, plus the styled
//! one-line helpers the binary uses for errors and warnings.

mod json_format;
mod plain;

pub use json_format::{print_json, write_json};
pub use plain::{print_error, print_info, print_plain, print_warning, write_plain};

use crate::orchestrator::RunSummary;
use serde::{Deserialize, Serialize};
use std::io;

/// Format of the run summary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    /// Human-readable table
    #[default]
    Plain,
    /// JSON structured output
    Json,
}

impl std::fmt::Display for SummaryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Print the summary in the requested format.
pub fn print_summary(summary: &RunSummary, format: SummaryFormat) -> io::Result<()> {
    match format {
        SummaryFormat::Plain => print_plain(summary),
        SummaryFormat::Json => print_json(summary),
    }
}
