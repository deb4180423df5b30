//! Descriptor Module
//!
//! Owns one host socket and translates every host primitive failure into a
//! [`CommunicationError`] of the matching kind. The descriptor is move-only:
//! there is no `Clone`, and the host handle is closed exactly once when the
//! owning value is dropped.

use entities_socket::{AddressFamily, CommunicationError, ErrorKind, Result, SocketKind};
use log::{trace, warn};
use socket2::{Domain, Protocol as Socket2Protocol, SockAddr, Socket as Socket2, Type};
use std::io::{self, Read, Write};
use std::mem::{ManuallyDrop, MaybeUninit};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
#[cfg(unix)]
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, RawFd};
#[cfg(windows)]
use std::os::windows::io::{AsRawSocket, RawSocket};

fn domain(family: AddressFamily) -> Domain {
    match family {
        AddressFamily::Ipv4 => Domain::IPV4,
        AddressFamily::Ipv6 => Domain::IPV6,
    }
}

fn host_error(
    kind: ErrorKind,
    message: &str,
) -> impl FnOnce(io::Error) -> CommunicationError + '_ {
    move |err| CommunicationError::with_host_error(kind, message, err)
}

fn internet_address(addr: SockAddr, kind: ErrorKind) -> Result<SocketAddr> {
    addr.as_socket()
        .ok_or_else(|| CommunicationError::new(kind, "Address is not an internet address"))
}

/// Owned host socket
///
/// Only the endpoint types of this crate construct descriptors. Callers can
/// borrow one through `Endpoint::descriptor` to apply host-level options
/// (timeouts, buffer sizes) that sit outside the endpoint contract.
pub struct Descriptor {
    socket: ManuallyDrop<Socket2>,
    kind: SocketKind,
    family: AddressFamily,
}

impl Descriptor {
    /// Allocate a new blocking descriptor of the given kind
    pub(crate) fn new(kind: SocketKind, family: AddressFamily) -> Result<Self> {
        let (ty, protocol) = if kind.is_stream() {
            (Type::STREAM, Socket2Protocol::TCP)
        } else {
            (Type::DGRAM, Socket2Protocol::UDP)
        };

        let socket = Socket2::new(domain(family), ty, Some(protocol))
            .map_err(host_error(ErrorKind::Creation, "Socket creation failed (socket())"))?;
        trace!("allocated {} descriptor ({:?})", kind, family);

        Ok(Self::adopt(socket, kind, family))
    }

    /// Take ownership of an already-open host socket
    fn adopt(socket: Socket2, kind: SocketKind, family: AddressFamily) -> Self {
        Self {
            socket: ManuallyDrop::new(socket),
            kind,
            family,
        }
    }

    /// Kind fixed at allocation
    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    /// Address family fixed at allocation
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Underlying `socket2` socket, for host-level options
    pub fn socket(&self) -> &Socket2 {
        &self.socket
    }

    pub(crate) fn set_reuse_address(&self, reuse: bool) -> Result<()> {
        self.socket
            .set_reuse_address(reuse)
            .map_err(host_error(ErrorKind::Option, "Set of address reuse failed (setsockopt())"))
    }

    pub(crate) fn bind(&self, addr: &SocketAddr) -> Result<()> {
        self.socket
            .bind(&SockAddr::from(*addr))
            .map_err(host_error(ErrorKind::Bind, "Set of local address and port failed (bind())"))
    }

    pub(crate) fn listen(&self, backlog: i32) -> Result<()> {
        if self.kind != SocketKind::StreamListener {
            return Err(CommunicationError::new(
                ErrorKind::Listen,
                format!("Listen is not supported on a {} socket", self.kind),
            ));
        }

        self.socket
            .listen(backlog)
            .map_err(host_error(ErrorKind::Listen, "Set listening socket failed (listen())"))
    }

    /// Accept one inbound connection; the new descriptor is a stream client
    pub(crate) fn accept(&self) -> Result<(Descriptor, SocketAddr)> {
        if self.kind != SocketKind::StreamListener {
            return Err(CommunicationError::new(
                ErrorKind::Accept,
                format!("Accept is not supported on a {} socket", self.kind),
            ));
        }

        let (socket, peer) = self
            .socket
            .accept()
            .map_err(host_error(ErrorKind::Accept, "Accept failed (accept())"))?;
        let accepted = Descriptor::adopt(socket, SocketKind::StreamClient, self.family);
        let peer = internet_address(peer, ErrorKind::Accept)?;

        Ok((accepted, peer))
    }

    pub(crate) fn connect(&self, addr: &SocketAddr) -> Result<()> {
        self.socket
            .connect(&SockAddr::from(*addr))
            .map_err(host_error(ErrorKind::Connect, "Connect failed (connect())"))
    }

    /// Clear the default peer of a datagram socket
    ///
    /// Hosts that report `EAFNOSUPPORT` for an `AF_UNSPEC` connect have still
    /// dissolved the association.
    #[cfg(unix)]
    pub(crate) fn dissolve_association(&self) -> Result<()> {
        // SAFETY: an all-zero `sockaddr` is a valid value; only its family is set.
        let mut unspec: libc::sockaddr = unsafe { std::mem::zeroed() };
        unspec.sa_family = libc::AF_UNSPEC as libc::sa_family_t;

        // SAFETY: the descriptor is open for the lifetime of `self` and the
        // address pointer and length describe `unspec`.
        let rc = unsafe {
            libc::connect(
                self.socket.as_raw_fd(),
                &unspec,
                std::mem::size_of::<libc::sockaddr>() as libc::socklen_t,
            )
        };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EAFNOSUPPORT) {
            Ok(())
        } else {
            Err(CommunicationError::with_host_error(
                ErrorKind::Disconnect,
                "Disconnect failed (connect())",
                err,
            ))
        }
    }

    #[cfg(not(unix))]
    pub(crate) fn dissolve_association(&self) -> Result<()> {
        let unspecified = self.family.any_with_port(0);
        self.socket
            .connect(&SockAddr::from(unspecified))
            .map_err(host_error(ErrorKind::Disconnect, "Disconnect failed (connect())"))
    }

    /// Send every byte of `buf` to the connected peer
    pub(crate) fn send_all(&self, buf: &[u8]) -> Result<()> {
        if self.kind.is_stream() {
            // write_all skips the host call for an empty buffer, which would
            // hide a missing peer
            if buf.is_empty() {
                return self
                    .socket
                    .send(buf)
                    .map(|_| ())
                    .map_err(host_error(ErrorKind::Transmit, "Send failed (send())"));
            }
            return (&*self.socket)
                .write_all(buf)
                .map_err(host_error(ErrorKind::Transmit, "Send failed (send())"));
        }

        let sent = self
            .socket
            .send(buf)
            .map_err(host_error(ErrorKind::Transmit, "Send failed (send())"))?;
        if sent != buf.len() {
            return Err(CommunicationError::new(
                ErrorKind::Transmit,
                format!("Send failed (sent {} of {} bytes)", sent, buf.len()),
            ));
        }
        Ok(())
    }

    pub(crate) fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        (&*self.socket)
            .read(buf)
            .map_err(host_error(ErrorKind::Receive, "Received failed (recv())"))
    }

    /// Send one datagram to an explicit destination
    pub(crate) fn send_to(&self, buf: &[u8], addr: &SocketAddr) -> Result<()> {
        let sent = self
            .socket
            .send_to(buf, &SockAddr::from(*addr))
            .map_err(host_error(ErrorKind::Transmit, "Send failed (sendto())"))?;
        if sent != buf.len() {
            return Err(CommunicationError::new(
                ErrorKind::Transmit,
                format!("Send failed (sent {} of {} bytes)", sent, buf.len()),
            ));
        }
        Ok(())
    }

    pub(crate) fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        // SAFETY: `u8` and `MaybeUninit<u8>` share a layout, and recvfrom
        // only ever writes initialized bytes into the buffer.
        let uninit_buf: &mut [MaybeUninit<u8>] = unsafe {
            std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut MaybeUninit<u8>, buf.len())
        };

        let (n, source) = self
            .socket
            .recv_from(uninit_buf)
            .map_err(host_error(ErrorKind::Receive, "Receive failed (recvfrom())"))?;
        let source = internet_address(source, ErrorKind::Receive)?;

        Ok((n, source))
    }

    /// Local address as reported by the host, even when no port is assigned
    pub(crate) fn raw_local_addr(&self) -> Result<SocketAddr> {
        let addr = self.socket.local_addr().map_err(host_error(
            ErrorKind::Query,
            "Fetch of local address failed (getsockname())",
        ))?;
        internet_address(addr, ErrorKind::Query)
    }

    /// Bound local address; an unbound descriptor is a query failure
    pub(crate) fn local_addr(&self) -> Result<SocketAddr> {
        let addr = self.raw_local_addr()?;
        if addr.port() == 0 {
            return Err(CommunicationError::new(
                ErrorKind::Query,
                "Fetch of local address failed (socket is not bound)",
            ));
        }
        Ok(addr)
    }

    pub(crate) fn peer_addr(&self) -> Result<SocketAddr> {
        let addr = self.socket.peer_addr().map_err(host_error(
            ErrorKind::Query,
            "Fetch of foreign address failed (getpeername())",
        ))?;
        internet_address(addr, ErrorKind::Query)
    }

    pub(crate) fn set_broadcast(&self) -> Result<()> {
        self.socket
            .set_broadcast(true)
            .map_err(host_error(ErrorKind::Option, "Set of broadcast failed (setsockopt())"))
    }

    pub(crate) fn set_multicast_ttl(&self, ttl: u8) -> Result<()> {
        let result = match self.family {
            AddressFamily::Ipv4 => self.socket.set_multicast_ttl_v4(u32::from(ttl)),
            AddressFamily::Ipv6 => self.socket.set_multicast_hops_v6(u32::from(ttl)),
        };
        result.map_err(host_error(ErrorKind::Option, "Multicast TTL set failed (setsockopt())"))
    }

    pub(crate) fn join_multicast_v4(&self, group: &Ipv4Addr) -> Result<()> {
        self.socket
            .join_multicast_v4(group, &Ipv4Addr::UNSPECIFIED)
            .map_err(host_error(
                ErrorKind::Multicast,
                "Multicast group join failed (setsockopt())",
            ))
    }

    pub(crate) fn leave_multicast_v4(&self, group: &Ipv4Addr) -> Result<()> {
        self.socket
            .leave_multicast_v4(group, &Ipv4Addr::UNSPECIFIED)
            .map_err(host_error(
                ErrorKind::Multicast,
                "Multicast group leave failed (setsockopt())",
            ))
    }

    pub(crate) fn join_multicast_v6(&self, group: &Ipv6Addr) -> Result<()> {
        self.socket
            .join_multicast_v6(group, 0)
            .map_err(host_error(
                ErrorKind::Multicast,
                "Multicast group join failed (setsockopt())",
            ))
    }

    pub(crate) fn leave_multicast_v6(&self, group: &Ipv6Addr) -> Result<()> {
        self.socket
            .leave_multicast_v6(group, 0)
            .map_err(host_error(
                ErrorKind::Multicast,
                "Multicast group leave failed (setsockopt())",
            ))
    }
}

impl std::fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Descriptor");
        debug.field("kind", &self.kind).field("family", &self.family);
        #[cfg(unix)]
        debug.field("fd", &self.socket.as_raw_fd());
        debug.finish()
    }
}

impl Drop for Descriptor {
    fn drop(&mut self) {
        // SAFETY: `socket` is not used again after being taken here.
        let socket = unsafe { ManuallyDrop::take(&mut self.socket) };
        release(socket, self.kind);
    }
}

/// Close the host handle; failures are logged and otherwise ignored
#[cfg(unix)]
fn release(socket: Socket2, kind: SocketKind) {
    let fd = socket.into_raw_fd();
    // SAFETY: `fd` came from `into_raw_fd`, so nothing else owns or closes it.
    if unsafe { libc::close(fd) } != 0 {
        warn!(
            "close of {} descriptor {} failed: {}",
            kind,
            fd,
            io::Error::last_os_error()
        );
    } else {
        trace!("closed {} descriptor {}", kind, fd);
    }
}

#[cfg(not(unix))]
fn release(socket: Socket2, kind: SocketKind) {
    drop(socket);
    trace!("closed {} descriptor", kind);
}

#[cfg(unix)]
impl AsRawFd for Descriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

#[cfg(unix)]
impl AsFd for Descriptor {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

#[cfg(windows)]
impl AsRawSocket for Descriptor {
    fn as_raw_socket(&self) -> RawSocket {
        self.socket.as_raw_socket()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> SocketAddr {
        SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0)
    }

    #[test]
    fn test_descriptor_creation() {
        let stream = Descriptor::new(SocketKind::StreamClient, AddressFamily::Ipv4).unwrap();
        assert_eq!(stream.kind(), SocketKind::StreamClient);
        assert_eq!(stream.family(), AddressFamily::Ipv4);

        let datagram = Descriptor::new(SocketKind::Datagram, AddressFamily::Ipv4).unwrap();
        assert_eq!(datagram.kind(), SocketKind::Datagram);
    }

    #[cfg(unix)]
    #[test]
    fn test_descriptor_is_blocking() {
        let descriptor = Descriptor::new(SocketKind::StreamClient, AddressFamily::Ipv4).unwrap();
        assert!(!descriptor.socket().nonblocking().unwrap());
    }

    #[test]
    fn test_local_addr_unbound_is_query_error() {
        let descriptor = Descriptor::new(SocketKind::Datagram, AddressFamily::Ipv4).unwrap();
        let err = descriptor.local_addr().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert_eq!(descriptor.raw_local_addr().unwrap().port(), 0);
    }

    #[test]
    fn test_bind_and_local_addr() {
        let descriptor = Descriptor::new(SocketKind::StreamListener, AddressFamily::Ipv4).unwrap();
        descriptor.bind(&loopback()).unwrap();

        let local = descriptor.local_addr().unwrap();
        assert_eq!(local.ip(), Ipv4Addr::LOCALHOST);
        assert!(local.port() > 0);
    }

    #[test]
    fn test_bind_address_in_use() {
        let first = Descriptor::new(SocketKind::StreamListener, AddressFamily::Ipv4).unwrap();
        first.bind(&loopback()).unwrap();
        first.listen(1).unwrap();
        let taken = first.local_addr().unwrap();

        let second = Descriptor::new(SocketKind::StreamListener, AddressFamily::Ipv4).unwrap();
        let err = second.bind(&taken).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bind);
        assert_eq!(err.host_error().map(io::Error::kind), Some(io::ErrorKind::AddrInUse));
    }

    #[test]
    fn test_listen_on_wrong_kind() {
        let descriptor = Descriptor::new(SocketKind::Datagram, AddressFamily::Ipv4).unwrap();
        descriptor.bind(&loopback()).unwrap();

        let err = descriptor.listen(5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Listen);
        assert!(err.host_error().is_none());
    }

    #[test]
    fn test_accept_on_wrong_kind() {
        let descriptor = Descriptor::new(SocketKind::StreamClient, AddressFamily::Ipv4).unwrap();
        let err = descriptor.accept().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Accept);
    }

    #[test]
    fn test_peer_addr_not_connected() {
        let descriptor = Descriptor::new(SocketKind::StreamClient, AddressFamily::Ipv4).unwrap();
        let err = descriptor.peer_addr().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert!(err.host_error().is_some());
    }

    #[test]
    fn test_connect_refused() {
        // Reserve a port, then close it so nothing is listening there
        let port = {
            let probe = Descriptor::new(SocketKind::StreamListener, AddressFamily::Ipv4).unwrap();
            probe.bind(&loopback()).unwrap();
            probe.local_addr().unwrap().port()
        };

        let descriptor = Descriptor::new(SocketKind::StreamClient, AddressFamily::Ipv4).unwrap();
        let target = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), port);
        let err = descriptor.connect(&target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connect);
    }

    #[test]
    fn test_send_without_peer() {
        let descriptor = Descriptor::new(SocketKind::Datagram, AddressFamily::Ipv4).unwrap();
        descriptor.bind(&loopback()).unwrap();

        let err = descriptor.send_all(b"nobody").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transmit);
    }

    #[test]
    fn test_datagram_send_to_recv_from() {
        let sender = Descriptor::new(SocketKind::Datagram, AddressFamily::Ipv4).unwrap();
        let receiver = Descriptor::new(SocketKind::Datagram, AddressFamily::Ipv4).unwrap();
        sender.bind(&loopback()).unwrap();
        receiver.bind(&loopback()).unwrap();
        receiver
            .socket()
            .set_read_timeout(Some(std::time::Duration::from_secs(5)))
            .unwrap();

        sender.send_to(b"datagram", &receiver.local_addr().unwrap()).unwrap();

        let mut buf = [0u8; 64];
        let (n, source) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"datagram");
        assert_eq!(source, sender.local_addr().unwrap());
    }

    #[test]
    fn test_dissolve_association() {
        let descriptor = Descriptor::new(SocketKind::Datagram, AddressFamily::Ipv4).unwrap();
        descriptor.bind(&loopback()).unwrap();
        descriptor
            .connect(&SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 9))
            .unwrap();
        assert!(descriptor.peer_addr().is_ok());

        descriptor.dissolve_association().unwrap();
        assert_eq!(descriptor.peer_addr().unwrap_err().kind(), ErrorKind::Query);
    }

    #[test]
    fn test_set_options() {
        let descriptor = Descriptor::new(SocketKind::Datagram, AddressFamily::Ipv4).unwrap();
        descriptor.set_broadcast().unwrap();
        assert!(descriptor.socket().broadcast().unwrap());

        descriptor.set_multicast_ttl(4).unwrap();
        assert_eq!(descriptor.socket().multicast_ttl_v4().unwrap(), 4);

        descriptor.set_reuse_address(true).unwrap();
        assert!(descriptor.socket().reuse_address().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_drop_releases_handle() {
        let descriptor = Descriptor::new(SocketKind::StreamClient, AddressFamily::Ipv4).unwrap();
        let fd = descriptor.as_raw_fd();
        assert!(fd >= 0);
        drop(descriptor);

        // SAFETY: F_GETFD only inspects the descriptor table.
        let rc = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        let reused = rc != -1;
        // Another test thread may have been handed the same number; when it
        // was not reused the host must report it as closed.
        if !reused {
            assert_eq!(io::Error::last_os_error().raw_os_error(), Some(libc::EBADF));
        }
    }
}
