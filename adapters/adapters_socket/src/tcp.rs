//! TCP Endpoint Module
//!
//! Connection-oriented endpoints: [`StreamClient`] talks to one peer and
//! [`StreamListener`] accepts inbound connections, producing one
//! independently owned `StreamClient` per connection.

use crate::descriptor::Descriptor;
use crate::endpoint::{sealed, ConnectedEndpoint, Endpoint};
use entities_socket::{EndpointConfig, Result, SocketKind};
use log::debug;
use std::io::{self, Read, Write};

/// TCP client endpoint
///
/// Either connects to a remote peer or is handed out, already connected, by
/// [`StreamListener::accept`]. A closed client cannot be reconnected.
#[derive(Debug)]
pub struct StreamClient {
    descriptor: Descriptor,
}

impl StreamClient {
    /// Create an unconnected client bound to an ephemeral local port
    ///
    /// # Returns
    ///
    /// * `Ok(StreamClient)` - Bound, unconnected client
    /// * `Err(CommunicationError)` - `CreationError` or `BindError`
    pub fn new() -> Result<Self> {
        Self::with_config(&EndpointConfig::default())
    }

    /// Create an unconnected client using `config`
    pub fn with_config(config: &EndpointConfig) -> Result<Self> {
        let mut client = Self::allocate(config)?;
        client.set_local_port(0)?;
        Ok(client)
    }

    /// Create a client and connect it to `foreign_address:foreign_port`
    ///
    /// If the connection fails the descriptor is released before the error
    /// is returned.
    ///
    /// # Returns
    ///
    /// * `Ok(StreamClient)` - Connected client
    /// * `Err(CommunicationError)` - `CreationError`, `ResolutionError` or `ConnectError`
    pub fn connect_to(foreign_address: &str, foreign_port: u16) -> Result<Self> {
        Self::connect_to_with_config(foreign_address, foreign_port, &EndpointConfig::default())
    }

    /// Create a client using `config` and connect it
    pub fn connect_to_with_config(
        foreign_address: &str,
        foreign_port: u16,
        config: &EndpointConfig,
    ) -> Result<Self> {
        let mut client = Self::allocate(config)?;
        client.connect(foreign_address, foreign_port)?;
        Ok(client)
    }

    /// Wrap a descriptor produced by `accept`
    pub(crate) fn from_accepted(descriptor: Descriptor) -> Self {
        Self { descriptor }
    }

    fn allocate(config: &EndpointConfig) -> Result<Self> {
        let descriptor = Descriptor::new(SocketKind::StreamClient, config.family)?;
        if config.reuse_address {
            descriptor.set_reuse_address(true)?;
        }
        Ok(Self { descriptor })
    }
}

impl sealed::Sealed for StreamClient {}

impl Endpoint for StreamClient {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}

impl ConnectedEndpoint for StreamClient {}

impl Read for StreamClient {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.recv(buf).map_err(io::Error::from)
    }
}

impl Write for StreamClient {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(buf).map_err(io::Error::from)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// TCP listening endpoint
///
/// Bound and listening from construction. The listener keeps no reference
/// to the clients it accepts.
#[derive(Debug)]
pub struct StreamListener {
    descriptor: Descriptor,
}

impl StreamListener {
    /// Listen on `local_port` on every local interface
    ///
    /// # Returns
    ///
    /// * `Ok(StreamListener)` - Listening endpoint
    /// * `Err(CommunicationError)` - `CreationError`, `BindError` or `ListenError`
    pub fn new(local_port: u16) -> Result<Self> {
        Self::with_config(None, local_port, &EndpointConfig::default())
    }

    /// Listen on a specific local address and port
    pub fn with_address(local_address: &str, local_port: u16) -> Result<Self> {
        Self::with_config(Some(local_address), local_port, &EndpointConfig::default())
    }

    /// Listen using `config`; `None` binds every local interface
    pub fn with_config(
        local_address: Option<&str>,
        local_port: u16,
        config: &EndpointConfig,
    ) -> Result<Self> {
        let descriptor = Descriptor::new(SocketKind::StreamListener, config.family)?;
        if config.reuse_address {
            descriptor.set_reuse_address(true)?;
        }

        let mut listener = Self { descriptor };
        match local_address {
            Some(address) => listener.set_local_address_and_port(address, local_port)?,
            None => listener.set_local_port(local_port)?,
        }
        listener.set_listen(config.backlog)?;
        Ok(listener)
    }

    fn set_listen(&self, backlog: i32) -> Result<()> {
        self.descriptor.listen(backlog)?;
        debug!("listening with backlog {}", backlog);
        Ok(())
    }

    /// Block until an inbound connection arrives
    ///
    /// # Returns
    ///
    /// * `Ok(StreamClient)` - Connected client owning the new descriptor
    /// * `Err(CommunicationError)` - `AcceptError`
    pub fn accept(&mut self) -> Result<StreamClient> {
        let (descriptor, peer) = self.descriptor.accept()?;
        debug!("accepted connection from {}", peer);
        Ok(StreamClient::from_accepted(descriptor))
    }
}

impl sealed::Sealed for StreamListener {}

impl Endpoint for StreamListener {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}
