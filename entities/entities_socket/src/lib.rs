//! Entities Layer: Socket Vocabulary
//!
//! Provides the types shared by every socket endpoint: the single structured
//! error value, the socket kinds, address families and endpoint configuration.
//!
//! ## Overview
//!
//! The `entities_socket` crate is the leaf of the workspace. It performs no
//! I/O; the adapters layer translates host failures into [`CommunicationError`]
//! values and uses [`EndpointConfig`] to decide how descriptors are created.
//!
//! ## Modules
//!
//! - **[`error`](error/index.html)**: `CommunicationError` and its `ErrorKind`
//! - **[`kind`](kind/index.html)**: socket kinds and address families
//! - **[`config`](config/index.html)**: endpoint configuration and defaults
//!
//! ## Usage
//!
//! ```rust
//! use entities_socket::{CommunicationError, ErrorKind};
//!
//! let err = CommunicationError::new(ErrorKind::Query, "Not connected");
//! assert_eq!(err.kind(), ErrorKind::Query);
//! assert_eq!(err.to_string(), "Not connected");
//! ```
//!
//! ## See Also
//!
//! - [`adapters_socket`](../adapters_socket/index.html): Endpoint implementations

pub mod config;
pub mod error;
pub mod kind;

pub use config::{EndpointConfig, DEFAULT_BACKLOG, DEFAULT_SERVICE_PROTOCOL};
pub use error::{CommunicationError, ErrorKind, Result};
pub use kind::{AddressFamily, SocketKind};
