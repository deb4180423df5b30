//! Command-Line Argument Parsing Module
//!
//! Uses clap for type-safe argument parsing.

use clap::{Parser, Subcommand};
use entities_socket::{AddressFamily, EndpointConfig, DEFAULT_BACKLOG, DEFAULT_SERVICE_PROTOCOL};

/// Blocking TCP/UDP socket tools
#[derive(Parser, Debug)]
#[command(name = "socktool")]
#[command(about = "Echo, multicast and service lookup tools over blocking sockets")]
pub struct ToolArgs {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use IPv6 descriptors instead of IPv4
    #[arg(long, global = true)]
    pub ipv6: bool,

    /// Receive buffer size in bytes
    #[arg(long, default_value_t = 4096, global = true)]
    pub buffer_size: usize,

    #[command(subcommand)]
    pub command: Command,
}

/// Tool to run
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Accept TCP connections and echo every byte back
    TcpEchoServer {
        /// Local port (number or service name)
        port: String,
        /// Pending connection queue length
        #[arg(long, default_value_t = DEFAULT_BACKLOG)]
        backlog: i32,
        /// Stop after serving this many connections
        #[arg(long)]
        max_connections: Option<usize>,
    },
    /// Send a message to a TCP echo server and print the reply
    TcpEchoClient {
        /// Server address
        server: String,
        /// Message to send
        message: String,
        /// Server port (number or service name)
        #[arg(default_value = "echo")]
        port: String,
    },
    /// Receive UDP datagrams and send each one back to its sender
    UdpEchoServer {
        /// Local port (number or service name)
        port: String,
        /// Stop after echoing this many datagrams
        #[arg(long)]
        max_datagrams: Option<usize>,
    },
    /// Send a datagram to a UDP echo server and print the reply
    UdpEchoClient {
        /// Server address
        server: String,
        /// Message to send
        message: String,
        /// Server port (number or service name)
        #[arg(default_value = "echo")]
        port: String,
    },
    /// Send a message to a multicast group repeatedly
    MulticastSend {
        /// Multicast group address
        group: String,
        /// Destination port
        port: u16,
        /// Message to send
        message: String,
        /// Multicast hop limit
        #[arg(long, default_value_t = 1)]
        ttl: u8,
        /// Number of datagrams to send
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Delay between datagrams in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
    /// Join a multicast group and print the datagrams it receives
    MulticastRecv {
        /// Multicast group address
        group: String,
        /// Local port
        port: u16,
        /// Stop after this many datagrams
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Resolve a service name to its port
    ResolveService {
        /// Service name or number
        service: String,
        /// Protocol qualifier
        #[arg(default_value = DEFAULT_SERVICE_PROTOCOL)]
        protocol: String,
    },
}

impl ToolArgs {
    /// Endpoint configuration shared by every tool
    pub fn endpoint_config(&self) -> EndpointConfig {
        let family = if self.ipv6 {
            AddressFamily::Ipv6
        } else {
            AddressFamily::Ipv4
        };
        let config = EndpointConfig::default().with_family(family);
        match &self.command {
            Command::TcpEchoServer { backlog, .. } => config.with_backlog(*backlog),
            Command::MulticastRecv { .. } => config.with_reuse_address(true),
            _ => config,
        }
    }

    /// Log filter implied by `--verbose`
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_size == 0 {
            return Err("--buffer-size must be greater than zero".to_string());
        }
        if let Command::TcpEchoServer { backlog, .. } = &self.command {
            if *backlog <= 0 {
                return Err("--backlog must be greater than zero".to_string());
            }
        }
        Ok(())
    }
}
