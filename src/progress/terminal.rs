//! Fixed-row terminal rendering.
//!
//! `TerminalReporter` owns the screen from the first write on: it clears it,
//! then hands out rows top to bottom. Status lines and bars share the same
//! row counter, so every write is addressed absolutely and no two writers
//! ever race for the cursor.
//!
//! Rows are not scrolled: once the counter passes the terminal height, the
//! terminal clamps the cursor and later rows overwrite the bottom line. Large
//! sweeps on short terminals should use `--progress bars`.

use super::{render_bar, ProgressReporter};
use console::Term;
use std::io;
use std::net::Ipv4Addr;
use std::sync::Mutex;

struct Screen {
    term: Term,
    /// Next unused 1-based row.
    next_row: u16,
    cleared: bool,
}

impl Screen {
    fn ensure_cleared(&mut self) -> io::Result<()> {
        if !self.cleared {
            self.term.clear_screen()?;
            self.cleared = true;
        }
        Ok(())
    }

    fn take_row(&mut self) -> u16 {
        let row = self.next_row;
        self.next_row = self.next_row.saturating_add(1);
        row
    }

    fn write_at(&mut self, row: u16, text: &str, newline: bool) -> io::Result<()> {
        self.term.move_cursor_to(0, usize::from(row.saturating_sub(1)))?;
        self.term.clear_line()?;
        if newline {
            self.term.write_line(text)?;
        } else {
            self.term.write_str(text)?;
        }
        self.term.flush()
    }
}

/// ANSI fixed-row progress display on stdout.
pub struct TerminalReporter {
    screen: Mutex<Screen>,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self::with_term(Term::stdout())
    }

    pub fn with_term(term: Term) -> Self {
        Self {
            screen: Mutex::new(Screen {
                term,
                next_row: 1,
                cleared: false,
            }),
        }
    }

    fn with_screen<T>(&self, f: impl FnOnce(&mut Screen) -> io::Result<T>) -> Option<T> {
        let result = {
            let mut screen = self
                .screen
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            screen.ensure_cleared().and_then(|_| f(&mut screen))
        };
        // Logged after unlocking: log lines may be routed back through `message`.
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, "terminal write failed");
                None
            }
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for TerminalReporter {
    fn allocate_row(&self) -> u16 {
        let mut screen = self
            .screen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        screen.take_row()
    }

    fn update(&self, host: Ipv4Addr, completed: u64, total: u64, row: u16) {
        let line = render_bar(host, completed, total);
        self.with_screen(|screen| screen.write_at(row, &line, completed >= total));
    }

    fn message(&self, line: &str) {
        self.with_screen(|screen| {
            let row = screen.take_row();
            screen.write_at(row, line, true)
        });
    }

    fn finish(&self) {
        self.with_screen(|screen| {
            let row = screen.next_row;
            screen.term.move_cursor_to(0, usize::from(row.saturating_sub(1)))?;
            screen.term.flush()
        });
    }
}

/// Plain line output for non-interactive stdout.
///
/// Bars are not drawn; a host's bar is replaced by one line when it finishes.
pub struct LineReporter {
    next_row: Mutex<u16>,
    out: Mutex<Term>,
}

impl LineReporter {
    pub fn new() -> Self {
        Self {
            next_row: Mutex::new(1),
            out: Mutex::new(Term::stdout()),
        }
    }

    fn write(&self, line: &str) {
        let out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = out.write_line(line) {
            tracing::debug!(error = %e, "stdout write failed");
        }
    }
}

impl Default for LineReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for LineReporter {
    fn allocate_row(&self) -> u16 {
        let mut next = self
            .next_row
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let row = *next;
        *next = next.saturating_add(1);
        row
    }

    fn update(&self, host: Ipv4Addr, completed: u64, total: u64, _row: u16) {
        if completed >= total {
            self.write(&render_bar(host, completed, total));
        } else {
            tracing::trace!(%host, completed, total, "progress");
        }
    }

    fn message(&self, line: &str) {
        self.write(line);
    }
}
