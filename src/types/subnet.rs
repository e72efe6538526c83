//! The /24 network a sweep covers.
//!
//! Accepts the forms people actually type:
//! - A three-octet prefix ("192.168.1")
//! - CIDR notation ("192.168.1.0/24")
//! - Any address inside the network ("192.168.1.42")

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Error type for subnet parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubnetError {
    #[error("invalid subnet format: {0}")]
    InvalidFormat(String),
    #[error("only /24 networks can be swept, got /{0}")]
    UnsupportedPrefix(u8),
}

/// An IPv4 /24 network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subnet {
    network: Ipv4Network,
}

impl Subnet {
    /// Number of host candidates in a /24 (`.1` through `.254`).
    pub const HOST_COUNT: usize = 254;

    /// Derive the /24 containing `address`.
    pub fn containing(address: Ipv4Addr) -> Self {
        let [a, b, c, _] = address.octets();
        let base = Ipv4Addr::new(a, b, c, 0);
        // A /24 prefix is always valid.
        let network = Ipv4Network::new(base, 24).unwrap_or_else(|_| Ipv4Network::from(base));
        Self { network }
    }

    /// The first three octets, dotted.
    pub fn prefix(&self) -> String {
        let [a, b, c, _] = self.network.network().octets();
        format!("{}.{}.{}", a, b, c)
    }

    /// Candidate host addresses, `.1` through `.254`, in numeric order.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> {
        let [a, b, c, _] = self.network.network().octets();
        (1..=254u8).map(move |d| Ipv4Addr::new(a, b, c, d))
    }

    pub fn contains(&self, address: Ipv4Addr) -> bool {
        self.network.contains(address)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.0/24", self.prefix())
    }
}

impl FromStr for Subnet {
    type Err = SubnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.contains('/') {
            let network: Ipv4Network = s
                .parse()
                .map_err(|_| SubnetError::InvalidFormat(s.to_string()))?;
            if network.prefix() != 24 {
                return Err(SubnetError::UnsupportedPrefix(network.prefix()));
            }
            return Ok(Self::containing(network.network()));
        }

        if let Ok(address) = s.parse::<Ipv4Addr>() {
            return Ok(Self::containing(address));
        }

        // Three-octet prefix
        format!("{}.0", s)
            .parse::<Ipv4Addr>()
            .map(Self::containing)
            .map_err(|_| SubnetError::InvalidFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subnet_from_address() {
        let subnet = Subnet::containing(Ipv4Addr::new(192, 168, 42, 99));
        assert_eq!(subnet.to_string(), "192.168.42.0/24");
        assert_eq!(subnet.prefix(), "192.168.42");
    }

    #[test]
    fn test_subnet_parsing_forms() {
        let expected = Subnet::containing(Ipv4Addr::new(10, 1, 2, 0));
        assert_eq!("10.1.2".parse::<Subnet>().unwrap(), expected);
        assert_eq!("10.1.2.0/24".parse::<Subnet>().unwrap(), expected);
        assert_eq!("10.1.2.77".parse::<Subnet>().unwrap(), expected);
    }

    #[test]
    fn test_subnet_rejects_other_prefixes() {
        assert_eq!(
            "10.1.0.0/16".parse::<Subnet>(),
            Err(SubnetError::UnsupportedPrefix(16))
        );
        assert!("not-a-net".parse::<Subnet>().is_err());
        assert!("10.1".parse::<Subnet>().is_err());
    }

    #[test]
    fn test_hosts_skip_network_and_broadcast() {
        let subnet: Subnet = "192.168.1".parse().unwrap();
        let hosts: Vec<Ipv4Addr> = subnet.hosts().collect();
        assert_eq!(hosts.len(), Subnet::HOST_COUNT);
        assert_eq!(hosts[0], Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(hosts[253], Ipv4Addr::new(192, 168, 1, 254));
        assert!(hosts.iter().all(|h| subnet.contains(*h)));
    }
}
