//! socktool Binary Entry Point
//!
//! Parses the command line, sets up logging and runs one tool.

use std::process;
use std::time::Duration;

use adapters_socket::lifecycle;
use clap::Parser;
use entities_socket::{Result, DEFAULT_SERVICE_PROTOCOL};
use frameworks_socket_tools::args::{Command, ToolArgs};
use frameworks_socket_tools::commands;
use log::{error, info};

fn main() {
    let args = ToolArgs::parse();

    // Validate argument combinations
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        process::exit(2);
    }

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    if let Err(e) = lifecycle::initialize() {
        error!("failed to initialize sockets: {}", e);
        process::exit(1);
    }

    let outcome = run(&args);

    if let Err(e) = lifecycle::clean_up() {
        error!("failed to clean up sockets: {}", e);
    }

    match outcome {
        Ok(()) => process::exit(0),
        Err(e) => {
            error!("{} ({})", e, e.kind());
            process::exit(1);
        }
    }
}

fn run(args: &ToolArgs) -> Result<()> {
    let config = args.endpoint_config();
    let buffer_size = args.buffer_size;

    match &args.command {
        Command::TcpEchoServer {
            port,
            max_connections,
            ..
        } => {
            let port = commands::port_argument(port, "tcp")?;
            commands::tcp_echo_server(port, &config, buffer_size, *max_connections, |_| {})?;
        }
        Command::TcpEchoClient {
            server,
            message,
            port,
        } => {
            let port = commands::port_argument(port, "tcp")?;
            let reply =
                commands::tcp_echo_client(server, port, message.as_bytes(), &config, buffer_size)?;
            println!("{}", String::from_utf8_lossy(&reply));
        }
        Command::UdpEchoServer {
            port,
            max_datagrams,
        } => {
            let port = commands::port_argument(port, "udp")?;
            commands::udp_echo_server(port, &config, buffer_size, *max_datagrams, |_| {})?;
        }
        Command::UdpEchoClient {
            server,
            message,
            port,
        } => {
            let port = commands::port_argument(port, "udp")?;
            let reply =
                commands::udp_echo_client(server, port, message.as_bytes(), &config, buffer_size)?;
            println!("{}", String::from_utf8_lossy(&reply));
        }
        Command::MulticastSend {
            group,
            port,
            message,
            ttl,
            count,
            interval_ms,
        } => {
            commands::multicast_send(
                group,
                *port,
                message.as_bytes(),
                *ttl,
                *count,
                Duration::from_millis(*interval_ms),
                &config,
            )?;
        }
        Command::MulticastRecv { group, port, count } => {
            let datagrams = commands::multicast_recv(group, *port, *count, &config, buffer_size)?;
            for datagram in datagrams {
                println!("{}", String::from_utf8_lossy(&datagram));
            }
        }
        Command::ResolveService { service, protocol } => {
            let port = commands::port_argument(service, protocol)?;
            if protocol == DEFAULT_SERVICE_PROTOCOL {
                info!("{} resolves to port {}", service, port);
            } else {
                info!("{}/{} resolves to port {}", service, protocol, port);
            }
            println!("{}", port);
        }
    }
    Ok(())
}
