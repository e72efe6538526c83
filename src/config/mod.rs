//! Configuration management for netsweep.
//!
//! Provides XDG-compliant settings storage.

mod settings;

pub use settings::{AppSettings, Paths};
