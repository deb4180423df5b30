//! Communication Error Module
//!
//! Every failure of a host socket primitive surfaces as one
//! [`CommunicationError`]. The error carries the kind of operation that
//! failed, a caller-facing message and, when requested at the failure site,
//! the host error that caused it.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type used throughout the socket crates
pub type Result<T> = std::result::Result<T, CommunicationError>;

/// Kind of operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Descriptor allocation failed
    Creation,
    /// Local address could not be bound
    Bind,
    /// Descriptor could not be put into listening mode
    Listen,
    /// Connection handshake failed
    Connect,
    /// Inbound connection could not be accepted
    Accept,
    /// Bytes could not be sent
    Transmit,
    /// Bytes could not be received
    Receive,
    /// Local or foreign identity could not be queried
    Query,
    /// Host or service name could not be resolved
    Resolution,
    /// Socket option could not be set
    Option,
    /// Multicast membership could not be changed
    Multicast,
    /// Default datagram peer could not be cleared
    Disconnect,
}

impl ErrorKind {
    /// Name used when the kind is displayed on its own
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Creation => "CreationError",
            ErrorKind::Bind => "BindError",
            ErrorKind::Listen => "ListenError",
            ErrorKind::Connect => "ConnectError",
            ErrorKind::Accept => "AcceptError",
            ErrorKind::Transmit => "TransmitError",
            ErrorKind::Receive => "ReceiveError",
            ErrorKind::Query => "QueryError",
            ErrorKind::Resolution => "ResolutionError",
            ErrorKind::Option => "OptionError",
            ErrorKind::Multicast => "MulticastError",
            ErrorKind::Disconnect => "DisconnectError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured socket error
///
/// The message is composed once at construction and never changes. When a
/// host error is attached its description is appended to the message,
/// separated by `": "`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CommunicationError {
    kind: ErrorKind,
    message: String,
    #[source]
    host: Option<io::Error>,
}

impl CommunicationError {
    /// Create an error carrying only the caller's message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            host: None,
        }
    }

    /// Create an error whose message is suffixed with the host error text
    ///
    /// # Arguments
    ///
    /// * `kind` - Kind of operation that failed
    /// * `message` - Caller-facing description of the failed operation
    /// * `host` - Error reported by the host primitive
    pub fn with_host_error(kind: ErrorKind, message: impl Into<String>, host: io::Error) -> Self {
        let message = format!("{}: {}", message.into(), host);
        Self {
            kind,
            message,
            host: Some(host),
        }
    }

    /// Kind of operation that failed
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Full composed message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Host error captured at the failure site, if any
    pub fn host_error(&self) -> Option<&io::Error> {
        self.host.as_ref()
    }

    /// Raw OS error code of the host error, if any
    pub fn raw_os_error(&self) -> Option<i32> {
        self.host.as_ref().and_then(io::Error::raw_os_error)
    }
}

impl From<CommunicationError> for io::Error {
    fn from(err: CommunicationError) -> Self {
        let kind = match err.host.as_ref() {
            Some(host) => host.kind(),
            None => match err.kind {
                ErrorKind::Query | ErrorKind::Transmit => io::ErrorKind::NotConnected,
                ErrorKind::Resolution => io::ErrorKind::NotFound,
                _ => io::ErrorKind::Other,
            },
        };
        io::Error::new(kind, err)
    }
}
