//! Endpoint Configuration Module
//!
//! Settings applied when a descriptor is allocated and bound.

use crate::kind::AddressFamily;

/// Pending-connection queue length used when none is given
pub const DEFAULT_BACKLOG: i32 = 5;

/// Protocol used for service-name lookups when none is given
pub const DEFAULT_SERVICE_PROTOCOL: &str = "tcp";

/// Endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Address family of the descriptor
    pub family: AddressFamily,
    /// Maximum queued, not yet accepted connections (listeners only)
    pub backlog: i32,
    /// Set `SO_REUSEADDR` before binding
    pub reuse_address: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            family: AddressFamily::Ipv4,
            backlog: DEFAULT_BACKLOG,
            reuse_address: false,
        }
    }
}

impl EndpointConfig {
    /// Use the given address family
    pub fn with_family(mut self, family: AddressFamily) -> Self {
        self.family = family;
        self
    }

    /// Use the given listen backlog
    pub fn with_backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Allow the local address to be reused
    pub fn with_reuse_address(mut self, reuse: bool) -> Self {
        self.reuse_address = reuse;
        self
    }
}
