//! Resolution Module
//!
//! Maps textual hosts and service names to the numeric addresses and ports
//! the host primitives expect.

use entities_socket::{
    AddressFamily, CommunicationError, ErrorKind, Result, DEFAULT_SERVICE_PROTOCOL,
};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

/// Resolve `host` and `port` to an address usable with `family`
///
/// Literal addresses are used as-is; names go through the host resolver and
/// the first address of the requested family wins.
///
/// # Returns
///
/// * `Ok(SocketAddr)` - Resolved address
/// * `Err(CommunicationError)` - `ResolutionError` when nothing matches
pub fn resolve_address(host: &str, port: u16, family: AddressFamily) -> Result<SocketAddr> {
    resolve_for(ErrorKind::Resolution, host, port, family)
}

/// Resolve an address, reporting failure with the caller's error kind
///
/// Binding to an unresolvable name is a bind failure and sending to one is a
/// transmit failure, so those call sites choose the kind they report.
pub(crate) fn resolve_for(
    kind: ErrorKind,
    host: &str,
    port: u16,
    family: AddressFamily,
) -> Result<SocketAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        let addr = SocketAddr::new(ip, port);
        if family.matches(&addr) {
            return Ok(addr);
        }
        return Err(CommunicationError::new(
            kind,
            format!("Address {} does not match the {:?} socket family", host, family),
        ));
    }

    let candidates = (host, port).to_socket_addrs().map_err(|err| {
        CommunicationError::with_host_error(kind, format!("Failed to resolve name {}", host), err)
    })?;

    candidates
        .into_iter()
        .find(|addr| family.matches(addr))
        .ok_or_else(|| {
            CommunicationError::new(kind, format!("No {:?} address found for {}", family, host))
        })
}

/// Source of service-name to port mappings
#[cfg_attr(test, mockall::automock)]
pub trait ServiceDatabase {
    /// Port registered for `service` under `protocol`, in host byte order
    fn port_by_name(&self, service: &str, protocol: &str) -> Option<u16>;
}

/// The host's services database (`/etc/services` on unix)
#[derive(Debug, Default, Clone, Copy)]
pub struct HostServices;

#[cfg(unix)]
static SERVICES_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

impl ServiceDatabase for HostServices {
    #[cfg(unix)]
    fn port_by_name(&self, service: &str, protocol: &str) -> Option<u16> {
        use std::ffi::CString;

        let service = CString::new(service).ok()?;
        let protocol = CString::new(protocol).ok()?;

        // getservbyname returns a pointer into static storage
        let _guard = SERVICES_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // SAFETY: both arguments are valid NUL-terminated strings and the
        // returned entry is read before the lock is released.
        let entry = unsafe { libc::getservbyname(service.as_ptr(), protocol.as_ptr()) };
        if entry.is_null() {
            return None;
        }
        // SAFETY: non-null entries point at a valid `servent`.
        let port = unsafe { (*entry).s_port };
        Some(u16::from_be(port as u16))
    }

    #[cfg(not(unix))]
    fn port_by_name(&self, _service: &str, _protocol: &str) -> Option<u16> {
        None
    }
}

/// Resolve a service name (or numeric string) to a port
///
/// # Arguments
///
/// * `service` - Service name such as `"http"`, or a decimal port
/// * `protocol` - Protocol qualifier for the lookup, usually `"tcp"`
pub fn resolve_service(service: &str, protocol: &str) -> Result<u16> {
    resolve_service_in(&HostServices, service, protocol)
}

/// Resolve a service name under the default `"tcp"` protocol
pub fn resolve_tcp_service(service: &str) -> Result<u16> {
    resolve_service(service, DEFAULT_SERVICE_PROTOCOL)
}

/// Resolve a service name against an explicit services database
pub fn resolve_service_in<D>(database: &D, service: &str, protocol: &str) -> Result<u16>
where
    D: ServiceDatabase + ?Sized,
{
    if let Ok(port) = service.parse::<u16>() {
        return Ok(port);
    }

    database.port_by_name(service, protocol).ok_or_else(|| {
        CommunicationError::new(
            ErrorKind::Resolution,
            format!("Failed to resolve service {}/{}", service, protocol),
        )
    })
}
