//! Per-host checkpoint persistence.
//!
//! Every tested port is appended to `<host>.txt` as `"<port> <open|closed>"`,
//! and every open port additionally to `<host>_Open.txt`. A later run loads
//! the host file first and skips whatever it already lists, so an interrupted
//! sweep resumes where it stopped.
//!
//! The files assume a single writer per host: two processes sweeping the same
//! host at once can both test a port and append it twice. `load` keeps the
//! first line it sees for a port in that case.

mod file_store;

pub use file_store::CheckpointStore;

use crate::types::{Port, PortState};
use std::collections::BTreeMap;

/// Everything already known about one host's ports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostCheckpoint {
    ports: BTreeMap<Port, PortState>,
}

impl HostCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a state unless the port is already present.
    ///
    /// Returns `false` when the port was known, leaving the old state intact.
    pub fn insert(&mut self, port: Port, state: PortState) -> bool {
        match self.ports.entry(port) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(state);
                true
            }
        }
    }

    pub fn get(&self, port: Port) -> Option<PortState> {
        self.ports.get(&port).copied()
    }

    pub fn contains(&self, port: Port) -> bool {
        self.ports.contains_key(&port)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Ports in ascending order with their state.
    pub fn iter(&self) -> impl Iterator<Item = (Port, PortState)> + '_ {
        self.ports.iter().map(|(p, s)| (*p, *s))
    }

    /// Ascending list of ports recorded as open.
    pub fn open_ports(&self) -> Vec<Port> {
        self.iter()
            .filter(|(_, state)| state.is_open())
            .map(|(port, _)| port)
            .collect()
    }

    /// Parse the contents of a host file. Malformed lines are skipped.
    pub fn parse(content: &str) -> Self {
        let mut checkpoint = Self::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_record(line) {
                Some((port, state)) => {
                    if !checkpoint.insert(port, state) {
                        tracing::warn!(
                            line = index + 1,
                            %port,
                            "duplicate checkpoint entry, keeping the first"
                        );
                    }
                }
                None => tracing::debug!(line = index + 1, content = line, "skipping malformed checkpoint line"),
            }
        }

        checkpoint
    }
}

fn parse_record(line: &str) -> Option<(Port, PortState)> {
    let mut fields = line.split_whitespace();
    let port = fields.next()?.parse().ok()?;
    let state = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((port, state))
}

/// Render one host-file line (without the newline).
pub(crate) fn format_record(port: Port, state: PortState) -> String {
    format!("{} {}", port, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(n: u16) -> Port {
        Port::new(n).unwrap()
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let content = "22 open\nbogus\n23 closed\n0 open\n80 maybe\n443 open extra\n\n8080 closed\n";
        let checkpoint = HostCheckpoint::parse(content);

        assert_eq!(checkpoint.len(), 3);
        assert_eq!(checkpoint.get(port(22)), Some(PortState::Open));
        assert_eq!(checkpoint.get(port(23)), Some(PortState::Closed));
        assert_eq!(checkpoint.get(port(8080)), Some(PortState::Closed));
        assert!(!checkpoint.contains(port(80)));
        assert!(!checkpoint.contains(port(443)));
    }

    #[test]
    fn test_parse_keeps_first_duplicate() {
        let checkpoint = HostCheckpoint::parse("3 closed\n3 open\n");
        assert_eq!(checkpoint.len(), 1);
        assert_eq!(checkpoint.get(port(3)), Some(PortState::Closed));
    }

    #[test]
    fn test_insert_never_overwrites() {
        let mut checkpoint = HostCheckpoint::new();
        assert!(checkpoint.insert(port(7), PortState::Open));
        assert!(!checkpoint.insert(port(7), PortState::Closed));
        assert_eq!(checkpoint.get(port(7)), Some(PortState::Open));
    }

    #[test]
    fn test_open_ports_sorted() {
        let checkpoint = HostCheckpoint::parse("443 open\n22 open\n80 closed\n");
        assert_eq!(checkpoint.open_ports(), vec![port(22), port(443)]);
    }

    #[test]
    fn test_format_record_matches_parser() {
        let line = format_record(port(7), PortState::Open);
        assert_eq!(line, "7 open");
        assert_eq!(HostCheckpoint::parse(&line).get(port(7)), Some(PortState::Open));
    }
}
