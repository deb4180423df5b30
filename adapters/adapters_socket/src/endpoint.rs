//! Endpoint Module
//!
//! The two capability traits shared by every socket type:
//!
//! - [`Endpoint`]: local address binding and querying, implemented by all
//!   endpoints.
//! - [`ConnectedEndpoint`]: connect, send, receive and foreign address
//!   querying, implemented by endpoints that can have a fixed peer.
//!
//! Both traits are sealed; only the endpoint types of this crate implement
//! them.

use crate::descriptor::Descriptor;
use crate::resolve::{resolve_address, resolve_for};
use entities_socket::{ErrorKind, Result};
use log::{debug, trace};
use std::net::SocketAddr;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Base endpoint: owns one descriptor and its local address
pub trait Endpoint: sealed::Sealed {
    /// Borrow the owned descriptor
    fn descriptor(&self) -> &Descriptor;

    /// Bound local address and port
    ///
    /// # Returns
    ///
    /// * `Ok(SocketAddr)` - Local address
    /// * `Err(CommunicationError)` - `QueryError` if the endpoint is not bound
    fn local_socket_addr(&self) -> Result<SocketAddr> {
        self.descriptor().local_addr()
    }

    /// Bound local address, as text
    fn local_address(&self) -> Result<String> {
        Ok(self.local_socket_addr()?.ip().to_string())
    }

    /// Bound local port
    fn local_port(&self) -> Result<u16> {
        Ok(self.local_socket_addr()?.port())
    }

    /// Bind to `local_port` on every local interface
    ///
    /// Port 0 lets the host choose an ephemeral port.
    fn set_local_port(&mut self, local_port: u16) -> Result<()> {
        let descriptor = self.descriptor();
        let addr = descriptor.family().any_with_port(local_port);
        descriptor.bind(&addr)?;
        debug!("bound {} endpoint to {}", descriptor.kind(), addr);
        Ok(())
    }

    /// Bind to a specific local address and port
    ///
    /// An unresolvable address is reported as a `BindError`.
    fn set_local_address_and_port(&mut self, local_address: &str, local_port: u16) -> Result<()> {
        let descriptor = self.descriptor();
        let addr = resolve_for(ErrorKind::Bind, local_address, local_port, descriptor.family())?;
        descriptor.bind(&addr)?;
        debug!("bound {} endpoint to {}", descriptor.kind(), addr);
        Ok(())
    }
}

/// Endpoint that can exchange bytes with a fixed peer
pub trait ConnectedEndpoint: Endpoint {
    /// Establish the peer relationship
    ///
    /// Stream endpoints perform a blocking handshake. Datagram endpoints only
    /// record the default destination.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Peer established
    /// * `Err(CommunicationError)` - `ResolutionError` or `ConnectError`
    fn connect(&mut self, foreign_address: &str, foreign_port: u16) -> Result<()> {
        let descriptor = self.descriptor();
        let addr = resolve_address(foreign_address, foreign_port, descriptor.family())?;
        descriptor.connect(&addr)?;
        debug!("connected {} endpoint to {}", descriptor.kind(), addr);
        Ok(())
    }

    /// Send every byte of `buf` to the peer
    fn send(&mut self, buf: &[u8]) -> Result<()> {
        self.descriptor().send_all(buf)?;
        trace!("sent {} bytes", buf.len());
        Ok(())
    }

    /// Receive at most `buf.len()` bytes from the peer
    ///
    /// Blocks until data arrives. For stream endpoints `Ok(0)` means the peer
    /// closed the connection in an orderly way.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.descriptor().recv(buf)?;
        trace!("received {} bytes", n);
        Ok(n)
    }

    /// Peer address and port
    ///
    /// # Returns
    ///
    /// * `Ok(SocketAddr)` - Peer address
    /// * `Err(CommunicationError)` - `QueryError` if there is no peer
    fn foreign_socket_addr(&self) -> Result<SocketAddr> {
        self.descriptor().peer_addr()
    }

    /// Peer address, as text
    fn foreign_address(&self) -> Result<String> {
        Ok(self.foreign_socket_addr()?.ip().to_string())
    }

    /// Peer port
    fn foreign_port(&self) -> Result<u16> {
        Ok(self.foreign_socket_addr()?.port())
    }
}
