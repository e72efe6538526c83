//! Local address lookup.
//!
//! The sweep covers the /24 around this machine's own IPv4 address, taken
//! from the first suitable interface.

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::types::Subnet;
use pnet::datalink::{self, NetworkInterface};
use std::net::{IpAddr, Ipv4Addr};

/// This machine's IPv4 address, optionally on a named interface.
pub fn local_address(interface: Option<&str>) -> DiscoveryResult<Ipv4Addr> {
    let interfaces = datalink::interfaces();

    let candidates: Vec<&NetworkInterface> = match interface {
        Some(name) => interfaces.iter().filter(|iface| iface.name == name).collect(),
        None => interfaces
            .iter()
            .filter(|iface| !iface.is_loopback() && iface.is_up())
            .collect(),
    };

    let addresses: Vec<Ipv4Addr> = candidates
        .into_iter()
        .flat_map(interface_ipv4s)
        .collect();

    let chosen = pick_address(&addresses).ok_or(DiscoveryError::NoLocalAddress)?;
    tracing::debug!(address = %chosen, "detected local address");
    Ok(chosen)
}

/// The /24 this machine sits in.
pub fn local_subnet(interface: Option<&str>) -> DiscoveryResult<Subnet> {
    local_address(interface).map(Subnet::containing)
}

fn interface_ipv4s(interface: &NetworkInterface) -> Vec<Ipv4Addr> {
    interface
        .ips
        .iter()
        .filter_map(|ip| match ip.ip() {
            IpAddr::V4(addr) => Some(addr),
            _ => None,
        })
        .collect()
}

/// Prefer a private (RFC 1918) address, then any other routable one.
pub fn pick_address(addresses: &[Ipv4Addr]) -> Option<Ipv4Addr> {
    let usable = || {
        addresses
            .iter()
            .copied()
            .filter(|a| !a.is_loopback() && !a.is_link_local() && !a.is_unspecified())
    };

    usable().find(|a| a.is_private()).or_else(|| usable().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_prefers_private() {
        let addresses = [
            Ipv4Addr::LOCALHOST,
            Ipv4Addr::new(169, 254, 3, 4),
            Ipv4Addr::new(81, 2, 3, 4),
            Ipv4Addr::new(192, 168, 0, 17),
        ];
        assert_eq!(pick_address(&addresses), Some(Ipv4Addr::new(192, 168, 0, 17)));
    }

    #[test]
    fn test_pick_falls_back_to_public() {
        let addresses = [Ipv4Addr::LOCALHOST, Ipv4Addr::new(81, 2, 3, 4)];
        assert_eq!(pick_address(&addresses), Some(Ipv4Addr::new(81, 2, 3, 4)));
    }

    #[test]
    fn test_pick_none_when_only_loopback() {
        assert_eq!(pick_address(&[Ipv4Addr::LOCALHOST]), None);
        assert_eq!(pick_address(&[]), None);
    }

    #[test]
    fn test_unknown_interface_is_an_error() {
        let result = local_address(Some("no-such-interface-0"));
        assert!(matches!(result, Err(DiscoveryError::NoLocalAddress)));
    }
}
