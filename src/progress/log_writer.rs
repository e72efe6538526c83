//! Log output routed through a progress reporter.
//!
//! While a reporter owns the screen, anything written straight to the
//! terminal lands wherever the cursor happens to be. [`ReporterLog`] hands
//! each formatted log event to [`ProgressReporter::message`] instead, so log
//! lines take the same guard as the bars.

use super::ProgressReporter;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// `MakeWriter` that forwards log events to a reporter.
#[derive(Clone)]
pub struct ReporterLog {
    reporter: Arc<dyn ProgressReporter>,
}

impl ReporterLog {
    pub fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self { reporter }
    }
}

impl<'a> MakeWriter<'a> for ReporterLog {
    type Writer = LogLines;

    fn make_writer(&'a self) -> Self::Writer {
        LogLines {
            reporter: Arc::clone(&self.reporter),
            buf: Vec::new(),
        }
    }
}

/// Buffers one event and emits it line by line when dropped.
pub struct LogLines {
    reporter: Arc<dyn ProgressReporter>,
    buf: Vec<u8>,
}

impl io::Write for LogLines {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogLines {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.reporter.message(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingReporter;
    use std::io::Write;

    #[test]
    fn test_writer_emits_one_message_per_line() {
        let reporter = Arc::new(RecordingReporter::new());
        let log = ReporterLog::new(reporter.clone());

        {
            let mut writer = log.make_writer();
            writer.write_all(b"first line\nsecond").unwrap();
            writer.write_all(b" line\n\n").unwrap();
            assert!(reporter.messages().is_empty());
        }

        assert_eq!(reporter.messages(), vec!["first line", "second line"]);
    }

    #[test]
    fn test_log_events_reach_the_reporter() {
        let reporter = Arc::new(RecordingReporter::new());
        let subscriber = tracing_subscriber::fmt()
            .with_writer(ReporterLog::new(reporter.clone()))
            .with_ansi(false)
            .with_target(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(port = 80, "duplicate checkpoint entry");
            tracing::debug!("not shown");
        });

        let messages = reporter.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("WARN"));
        assert!(messages[0].contains("duplicate checkpoint entry"));
        assert!(messages[0].contains("port=80"));
    }
}
