//! Frameworks Layer: Socket Tools
//!
//! Command-line tools built on the blocking endpoints from `adapters_socket`:
//! TCP and UDP echo servers and clients, a multicast sender and receiver, and
//! service name lookup. The `socktool` binary wires these together; the
//! functions in [`commands`] can also be driven directly.
//!
//! ## Modules
//!
//! - **[`args`]**: clap argument definitions for `socktool`
//! - **[`commands`]**: one function per tool
//!
//! ## See Also
//!
//! - [`adapters_socket`]: the endpoint types the tools use

pub mod args;
pub mod commands;
