//! Socket Kind Module
//!
//! Socket kinds and address families. Both are fixed when a descriptor is
//! allocated and decide which operations are legal on it.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressFamily {
    /// IPv4
    #[default]
    Ipv4,
    /// IPv6
    Ipv6,
}

impl AddressFamily {
    /// Family of an already-parsed address
    pub fn of(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => AddressFamily::Ipv4,
            SocketAddr::V6(_) => AddressFamily::Ipv6,
        }
    }

    /// Whether `addr` can be used with a descriptor of this family
    pub fn matches(&self, addr: &SocketAddr) -> bool {
        AddressFamily::of(addr) == *self
    }

    /// Wildcard address of this family
    pub fn unspecified(&self) -> IpAddr {
        match self {
            AddressFamily::Ipv4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            AddressFamily::Ipv6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }

    /// Wildcard address of this family with the given port
    pub fn any_with_port(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.unspecified(), port)
    }
}

/// Socket kind
///
/// Determines the transport (stream or datagram) and whether the endpoint
/// is active or passive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketKind {
    /// Connection-oriented endpoint that talks to one peer
    StreamClient,
    /// Connection-oriented endpoint that accepts inbound connections
    StreamListener,
    /// Connectionless, message-oriented endpoint
    Datagram,
}

impl SocketKind {
    /// Stream kinds carry a reliable, ordered byte stream
    pub fn is_stream(&self) -> bool {
        matches!(self, SocketKind::StreamClient | SocketKind::StreamListener)
    }

    /// Protocol name used for service lookups
    pub fn protocol_name(&self) -> &'static str {
        if self.is_stream() {
            "tcp"
        } else {
            "udp"
        }
    }
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SocketKind::StreamClient => "stream-client",
            SocketKind::StreamListener => "stream-listener",
            SocketKind::Datagram => "datagram",
        };
        f.write_str(name)
    }
}
