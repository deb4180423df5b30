//! Adapters Layer: Blocking Socket Endpoints
//!
//! Provides a small object-style facade over the host's TCP and UDP socket
//! primitives. Every call blocks on one descriptor and every failure comes
//! back as a single [`CommunicationError`] tagged with its [`ErrorKind`].
//!
//! ## Overview
//!
//! The `adapters_socket` crate provides:
//! - **[`StreamClient`]**: TCP connection to one peer
//! - **[`StreamListener`]**: TCP listener producing one `StreamClient` per accepted connection
//! - **[`DatagramEndpoint`]**: UDP send-to/receive-from, default peer, multicast
//! - **[`Endpoint`] / [`ConnectedEndpoint`]**: the shared binding, querying and
//!   transfer operations
//! - **Resolution**: host names and service names to addresses and ports
//! - **Lifecycle**: process-wide initialize/clean-up hooks
//!
//! ## Usage
//!
//! ```rust,no_run
//! use adapters_socket::{ConnectedEndpoint, Endpoint, StreamClient, StreamListener};
//!
//! let mut listener = StreamListener::with_address("127.0.0.1", 0)?;
//! let port = listener.local_port()?;
//!
//! let mut client = StreamClient::connect_to("127.0.0.1", port)?;
//! client.send(b"hello")?;
//!
//! let mut server = listener.accept()?;
//! let mut buf = [0u8; 5];
//! let n = server.recv(&mut buf)?;
//! assert_eq!(&buf[..n], b"hello");
//! # Ok::<(), adapters_socket::CommunicationError>(())
//! ```
//!
//! ## Architecture
//!
//! This crate is part of the adapters layer. It depends on:
//! - `entities_socket`: error, kind and configuration types
//! - `socket2`: descriptor allocation and socket options
//!
//! ## Threading
//!
//! Endpoints are plain blocking handles. Mutating operations take
//! `&mut self`, so concurrent use of one endpoint has to be serialized by
//! the caller; concurrency comes from giving each endpoint its own thread.
//! There are no built-in timeouts; host-level options can be set on
//! `Endpoint::descriptor().socket()`.

pub mod descriptor;
pub mod endpoint;
pub mod lifecycle;
pub mod resolve;
pub mod tcp;
pub mod udp;

pub use descriptor::Descriptor;
pub use endpoint::{ConnectedEndpoint, Endpoint};
pub use entities_socket::{
    AddressFamily, CommunicationError, EndpointConfig, ErrorKind, Result, SocketKind,
    DEFAULT_BACKLOG, DEFAULT_SERVICE_PROTOCOL,
};
pub use resolve::{
    resolve_address, resolve_service, resolve_service_in, resolve_tcp_service, HostServices,
    ServiceDatabase,
};
pub use tcp::{StreamClient, StreamListener};
pub use udp::DatagramEndpoint;
