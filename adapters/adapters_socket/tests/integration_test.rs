//! Integration tests for adapters_socket crate
//!
//! End-to-end loopback workflows for stream and datagram endpoints.

use adapters_socket::*;
use std::thread;
use std::time::Duration;

fn bounded(endpoint: DatagramEndpoint, timeout: Duration) -> DatagramEndpoint {
    endpoint
        .descriptor()
        .socket()
        .set_read_timeout(Some(timeout))
        .unwrap();
    endpoint
}

#[test]
fn test_hello_over_ephemeral_listener() {
    let mut listener = StreamListener::new(0).unwrap();
    let port = listener.local_port().unwrap();
    assert!(port > 0);

    let client = thread::spawn(move || {
        let mut client = StreamClient::connect_to("127.0.0.1", port).unwrap();
        client.send(b"hello").unwrap();
    });

    let mut server = listener.accept().unwrap();
    let mut buf = [0u8; 5];
    let mut read = 0;
    while read < buf.len() {
        let n = server.recv(&mut buf[read..]).unwrap();
        assert!(n > 0, "peer closed before sending everything");
        read += n;
    }

    client.join().unwrap();
    assert_eq!(&buf, b"hello");
}

#[test]
fn test_echo_roundtrip_preserves_order() {
    let mut listener = StreamListener::with_address("127.0.0.1", 0).unwrap();
    let port = listener.local_port().unwrap();

    let server = thread::spawn(move || {
        let mut connection = listener.accept().unwrap();
        let mut buf = [0u8; 32];
        loop {
            let n = connection.recv(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            connection.send(&buf[..n]).unwrap();
        }
    });

    let mut client = StreamClient::new().unwrap();
    client.connect("127.0.0.1", port).unwrap();

    let messages: [&[u8]; 3] = [b"first", b"second message", b"third and last message"];
    for message in messages {
        client.send(message).unwrap();

        let mut echoed = vec![0u8; message.len()];
        let mut read = 0;
        while read < echoed.len() {
            read += client.recv(&mut echoed[read..]).unwrap();
        }
        assert_eq!(echoed, message);
    }

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_datagram_reports_true_sender() {
    let mut sender = DatagramEndpoint::with_address("127.0.0.1", 0).unwrap();
    let mut receiver = bounded(
        DatagramEndpoint::with_address("127.0.0.1", 0).unwrap(),
        Duration::from_secs(5),
    );

    sender
        .send_to(b"payload", "127.0.0.1", receiver.local_port().unwrap())
        .unwrap();

    let mut buf = [0u8; 64];
    let (n, address, port) = receiver.recv_from(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"payload");
    assert_eq!(address, sender.local_address().unwrap());
    assert_eq!(port, sender.local_port().unwrap());
}

#[test]
fn test_disconnect_keeps_descriptor_usable() {
    let mut sender = DatagramEndpoint::new().unwrap();
    let mut receiver = bounded(
        DatagramEndpoint::with_address("127.0.0.1", 0).unwrap(),
        Duration::from_secs(5),
    );
    let receiver_port = receiver.local_port().unwrap();

    sender.connect("127.0.0.1", receiver_port).unwrap();
    sender.disconnect().unwrap();
    sender.send_to(b"still open", "127.0.0.1", receiver_port).unwrap();

    let mut buf = [0u8; 64];
    let (n, _, _) = receiver.recv_from(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"still open");
}

#[test]
fn test_foreign_address_on_unconnected_endpoints() {
    let client = StreamClient::new().unwrap();
    assert_eq!(client.foreign_address().unwrap_err().kind(), ErrorKind::Query);

    let datagram = DatagramEndpoint::new().unwrap();
    assert_eq!(datagram.foreign_port().unwrap_err().kind(), ErrorKind::Query);
}

/// Set on hosts without a multicast-capable interface to skip group delivery
const NO_MULTICAST_ENV: &str = "SOCKET_TESTS_NO_MULTICAST";

#[test]
fn test_multicast_group_delivery() {
    const GROUP: &str = "239.0.0.1";

    if std::env::var_os(NO_MULTICAST_ENV).is_some() {
        eprintln!("multicast delivery skipped: {} is set", NO_MULTICAST_ENV);
        return;
    }

    let config = EndpointConfig::default().with_reuse_address(true);
    let mut receiver = bounded(
        DatagramEndpoint::with_config(None, 0, &config).unwrap(),
        Duration::from_secs(5),
    );
    let port = receiver.local_port().unwrap();
    receiver.join_group(GROUP).unwrap();

    let mut sender = DatagramEndpoint::new().unwrap();
    sender.set_multicast_ttl(1).unwrap();
    sender.send_to(b"to the group", GROUP, port).unwrap();

    let mut buf = [0u8; 64];
    let (n, _, source_port) = receiver.recv_from(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"to the group");
    assert_eq!(source_port, sender.local_port().unwrap());

    receiver.leave_group(GROUP).unwrap();
}

#[test]
fn test_resolve_tcp_service_numeric() {
    assert_eq!(resolve_tcp_service("7070").unwrap(), 7070);
}

#[test]
fn test_resolve_service_numeric_and_unknown() {
    assert_eq!(resolve_service("8080", DEFAULT_SERVICE_PROTOCOL).unwrap(), 8080);

    let err = resolve_service("definitely-not-a-service", "tcp").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
}

#[test]
fn test_resolve_address_matches_family() {
    let addr = resolve_address("127.0.0.1", 80, AddressFamily::Ipv4).unwrap();
    assert_eq!(addr.port(), 80);
    assert!(resolve_address("127.0.0.1", 80, AddressFamily::Ipv6).is_err());
}

#[test]
fn test_ipv6_loopback_when_available() {
    let config = EndpointConfig::default().with_family(AddressFamily::Ipv6);
    let mut listener = match StreamListener::with_config(Some("::1"), 0, &config) {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("skipping IPv6 loopback: {}", err);
            return;
        }
    };
    let port = listener.local_port().unwrap();

    let connector = thread::spawn(move || {
        let mut client = StreamClient::connect_to_with_config("::1", port, &config).unwrap();
        client.send(b"v6").unwrap();
    });

    let mut server = listener.accept().unwrap();
    let mut buf = [0u8; 2];
    let mut read = 0;
    while read < buf.len() {
        read += server.recv(&mut buf[read..]).unwrap();
    }
    connector.join().unwrap();

    assert_eq!(&buf, b"v6");
    assert_eq!(server.foreign_address().unwrap(), "::1");
}
