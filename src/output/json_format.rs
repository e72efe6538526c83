//! JSON output formatting.

use crate::orchestrator::RunSummary;
use std::io::{self, Write};

/// Write the summary as pretty JSON followed by a newline.
pub fn write_json(out: &mut impl Write, summary: &RunSummary) -> io::Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writeln!(out, "{}", json)
}

/// Print the summary in JSON format.
pub fn print_json(summary: &RunSummary) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_json(&mut out, summary)
}
