//! Tool Commands Module
//!
//! Each command drives the endpoint types directly: one blocking call at a
//! time, one connection or datagram at a time.

use adapters_socket::{
    resolve_service, ConnectedEndpoint, DatagramEndpoint, Endpoint, StreamClient, StreamListener,
};
use entities_socket::{EndpointConfig, Result};
use log::{debug, info, warn};
use std::thread;
use std::time::Duration;

/// Resolve a port argument given as a number or a service name
pub fn port_argument(port: &str, protocol: &str) -> Result<u16> {
    resolve_service(port, protocol)
}

/// Listen and echo every accepted connection back to its sender
///
/// Connections are served one after another. A failed connection is logged
/// and the server moves on to the next one.
///
/// # Returns
/// * `Ok(usize)` - Number of connections served (only when `max_connections` is set)
/// * `Err(CommunicationError)` - Listener setup or accept failure
pub fn tcp_echo_server(
    port: u16,
    config: &EndpointConfig,
    buffer_size: usize,
    max_connections: Option<usize>,
    on_ready: impl FnOnce(u16),
) -> Result<usize> {
    let mut listener = StreamListener::with_config(None, port, config)?;
    let local_port = listener.local_port()?;
    info!("echo server listening on port {}", local_port);
    on_ready(local_port);

    let mut served = 0;
    while max_connections.map_or(true, |max| served < max) {
        let mut connection = listener.accept()?;
        served += 1;
        match echo_connection(&mut connection, buffer_size) {
            Ok(total) => info!("echoed {} bytes", total),
            Err(err) => warn!("connection failed: {}", err),
        }
    }
    Ok(served)
}

fn echo_connection(connection: &mut StreamClient, buffer_size: usize) -> Result<usize> {
    let peer = connection.foreign_socket_addr()?;
    debug!("handling client {}", peer);

    let mut buf = vec![0u8; buffer_size];
    let mut total = 0;
    loop {
        let n = connection.recv(&mut buf)?;
        if n == 0 {
            return Ok(total);
        }
        connection.send(&buf[..n])?;
        total += n;
    }
}

/// Send `message` to an echo server and collect the same number of bytes back
pub fn tcp_echo_client(
    server: &str,
    port: u16,
    message: &[u8],
    config: &EndpointConfig,
    buffer_size: usize,
) -> Result<Vec<u8>> {
    let mut client = StreamClient::connect_to_with_config(server, port, config)?;
    client.send(message)?;

    let mut reply = Vec::with_capacity(message.len());
    let mut buf = vec![0u8; buffer_size];
    while reply.len() < message.len() {
        let n = client.recv(&mut buf)?;
        if n == 0 {
            warn!("server closed after {} of {} bytes", reply.len(), message.len());
            break;
        }
        reply.extend_from_slice(&buf[..n]);
    }
    Ok(reply)
}

/// Receive datagrams and send each one back to where it came from
///
/// # Returns
/// * `Ok(usize)` - Number of datagrams echoed (only when `max_datagrams` is set)
pub fn udp_echo_server(
    port: u16,
    config: &EndpointConfig,
    buffer_size: usize,
    max_datagrams: Option<usize>,
    on_ready: impl FnOnce(u16),
) -> Result<usize> {
    let mut endpoint = DatagramEndpoint::with_config(None, port, config)?;
    let local_port = endpoint.local_port()?;
    info!("datagram echo server on port {}", local_port);
    on_ready(local_port);

    let mut buf = vec![0u8; buffer_size];
    let mut echoed = 0;
    while max_datagrams.map_or(true, |max| echoed < max) {
        let (n, source_address, source_port) = endpoint.recv_from(&mut buf)?;
        debug!("{} bytes from {}:{}", n, source_address, source_port);
        endpoint.send_to(&buf[..n], &source_address, source_port)?;
        echoed += 1;
    }
    Ok(echoed)
}

/// Send one datagram to an echo server and return its reply
pub fn udp_echo_client(
    server: &str,
    port: u16,
    message: &[u8],
    config: &EndpointConfig,
    buffer_size: usize,
) -> Result<Vec<u8>> {
    let mut endpoint = DatagramEndpoint::with_config(None, 0, config)?;
    endpoint.send_to(message, server, port)?;

    let mut buf = vec![0u8; buffer_size];
    let (n, source_address, source_port) = endpoint.recv_from(&mut buf)?;
    debug!("reply from {}:{}", source_address, source_port);
    Ok(buf[..n].to_vec())
}

/// Send `message` to a multicast group `count` times
pub fn multicast_send(
    group: &str,
    port: u16,
    message: &[u8],
    ttl: u8,
    count: usize,
    interval: Duration,
    config: &EndpointConfig,
) -> Result<()> {
    let mut endpoint = DatagramEndpoint::with_config(None, 0, config)?;
    endpoint.set_multicast_ttl(ttl)?;

    for sent in 1..=count {
        endpoint.send_to(message, group, port)?;
        info!("sent datagram {} of {} to {}:{}", sent, count, group, port);
        if sent < count {
            thread::sleep(interval);
        }
    }
    Ok(())
}

/// Join a multicast group and collect `count` datagrams
pub fn multicast_recv(
    group: &str,
    port: u16,
    count: usize,
    config: &EndpointConfig,
    buffer_size: usize,
) -> Result<Vec<Vec<u8>>> {
    let mut endpoint = DatagramEndpoint::with_config(None, port, config)?;
    endpoint.join_group(group)?;

    let mut buf = vec![0u8; buffer_size];
    let mut received = Vec::with_capacity(count);
    while received.len() < count {
        let (n, source_address, source_port) = endpoint.recv_from(&mut buf)?;
        debug!("{} bytes from {}:{}", n, source_address, source_port);
        received.push(buf[..n].to_vec());
    }

    endpoint.leave_group(group)?;
    Ok(received)
}
