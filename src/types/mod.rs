//! Core type definitions using newtype patterns for type safety.

mod port;
mod subnet;

pub use port::{Port, PortError, PortRange, PortState};
pub use subnet::{Subnet, SubnetError};
