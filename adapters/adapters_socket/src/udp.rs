//! UDP Endpoint Module
//!
//! Provides [`DatagramEndpoint`], a connectionless endpoint with per-message
//! addressing, an optional default peer and multicast group membership.

use crate::descriptor::Descriptor;
use crate::endpoint::{sealed, ConnectedEndpoint, Endpoint};
use crate::resolve::resolve_for;
use entities_socket::{CommunicationError, EndpointConfig, ErrorKind, Result, SocketKind};
use log::{debug, trace};
use std::net::{IpAddr, SocketAddr};

/// UDP endpoint
///
/// Always bound after construction, and broadcast destinations are always
/// permitted.
#[derive(Debug)]
pub struct DatagramEndpoint {
    descriptor: Descriptor,
}

impl DatagramEndpoint {
    /// Create an endpoint bound to an ephemeral port on every interface
    ///
    /// # Returns
    ///
    /// * `Ok(DatagramEndpoint)` - Bound endpoint
    /// * `Err(CommunicationError)` - `CreationError`, `OptionError` or `BindError`
    pub fn new() -> Result<Self> {
        Self::with_config(None, 0, &EndpointConfig::default())
    }

    /// Create an endpoint bound to `local_port` on every interface
    pub fn with_port(local_port: u16) -> Result<Self> {
        Self::with_config(None, local_port, &EndpointConfig::default())
    }

    /// Create an endpoint bound to a specific local address and port
    pub fn with_address(local_address: &str, local_port: u16) -> Result<Self> {
        Self::with_config(Some(local_address), local_port, &EndpointConfig::default())
    }

    /// Create an endpoint using `config`; `None` binds every local interface
    pub fn with_config(
        local_address: Option<&str>,
        local_port: u16,
        config: &EndpointConfig,
    ) -> Result<Self> {
        let descriptor = Descriptor::new(SocketKind::Datagram, config.family)?;
        descriptor.set_broadcast()?;
        if config.reuse_address {
            descriptor.set_reuse_address(true)?;
        }

        let mut endpoint = Self { descriptor };
        match local_address {
            Some(address) => endpoint.set_local_address_and_port(address, local_port)?,
            None => endpoint.set_local_port(local_port)?,
        }
        Ok(endpoint)
    }

    /// Send one datagram to an explicit destination
    ///
    /// Any default peer set by `connect` is ignored. An unresolvable
    /// destination is reported as a `TransmitError`.
    pub fn send_to(&mut self, buf: &[u8], foreign_address: &str, foreign_port: u16) -> Result<()> {
        let addr = resolve_for(
            ErrorKind::Transmit,
            foreign_address,
            foreign_port,
            self.descriptor.family(),
        )?;
        self.descriptor.send_to(buf, &addr)?;
        trace!("sent {} byte datagram to {}", buf.len(), addr);
        Ok(())
    }

    /// Block until a datagram arrives
    ///
    /// At most `buf.len()` bytes are stored; the rest of a longer datagram is
    /// discarded by the host.
    ///
    /// # Returns
    ///
    /// * `Ok((usize, String, u16))` - Byte count, source address and source port
    /// * `Err(CommunicationError)` - `ReceiveError`
    pub fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, String, u16)> {
        let (n, source) = self.descriptor.recv_from(buf)?;
        trace!("received {} byte datagram from {}", n, source);
        Ok((n, source.ip().to_string(), source.port()))
    }

    /// Clear the default peer set by `connect`
    ///
    /// Some hosts drop an ephemeral local port when the association is
    /// dissolved; the endpoint is then bound to a fresh ephemeral port on the
    /// address it kept. A failure of that rebind is reported as `BindError`.
    pub fn disconnect(&mut self) -> Result<()> {
        self.descriptor.dissolve_association()?;

        let local = self.descriptor.raw_local_addr()?;
        if local.port() == 0 {
            let rebind = SocketAddr::new(local.ip(), 0);
            self.descriptor.bind(&rebind)?;
            debug!("rebound datagram endpoint to {} after disconnect", rebind);
        }
        debug!("cleared default peer of datagram endpoint");
        Ok(())
    }

    /// Set the hop limit of outgoing multicast datagrams
    pub fn set_multicast_ttl(&mut self, ttl: u8) -> Result<()> {
        self.descriptor.set_multicast_ttl(ttl)
    }

    /// Join the multicast group `group` on the default interface
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Membership added
    /// * `Err(CommunicationError)` - `MulticastError`
    pub fn join_group(&mut self, group: &str) -> Result<()> {
        match self.multicast_group(group)? {
            IpAddr::V4(v4) => self.descriptor.join_multicast_v4(&v4)?,
            IpAddr::V6(v6) => self.descriptor.join_multicast_v6(&v6)?,
        }
        debug!("joined multicast group {}", group);
        Ok(())
    }

    /// Leave the multicast group `group`
    pub fn leave_group(&mut self, group: &str) -> Result<()> {
        match self.multicast_group(group)? {
            IpAddr::V4(v4) => self.descriptor.leave_multicast_v4(&v4)?,
            IpAddr::V6(v6) => self.descriptor.leave_multicast_v6(&v6)?,
        }
        debug!("left multicast group {}", group);
        Ok(())
    }

    fn multicast_group(&self, group: &str) -> Result<IpAddr> {
        let ip: IpAddr = group.parse().map_err(|_| {
            CommunicationError::new(
                ErrorKind::Multicast,
                format!("Invalid multicast group address {}", group),
            )
        })?;
        if !ip.is_multicast() {
            return Err(CommunicationError::new(
                ErrorKind::Multicast,
                format!("{} is not a multicast address", group),
            ));
        }

        let family = self.descriptor.family();
        if !family.matches(&SocketAddr::new(ip, 0)) {
            return Err(CommunicationError::new(
                ErrorKind::Multicast,
                format!("Group {} does not match the {:?} socket family", group, family),
            ));
        }
        Ok(ip)
    }
}

impl sealed::Sealed for DatagramEndpoint {}

impl Endpoint for DatagramEndpoint {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}

impl ConnectedEndpoint for DatagramEndpoint {}
