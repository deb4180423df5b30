//! Descriptor release on failed construction
//!
//! Kept in its own test binary with a single test so nothing else opens
//! descriptors while the process-wide descriptor table is being counted.

use adapters_socket::*;

#[cfg(target_os = "linux")]
fn open_descriptors() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_construction_releases_descriptor() {
    // Reserve a port, then close it so nothing is listening there
    let port = {
        let listener = StreamListener::with_address("127.0.0.1", 0).unwrap();
        listener.local_port().unwrap()
    };

    let before = open_descriptors();
    for _ in 0..50 {
        let err = StreamClient::connect_to("127.0.0.1", port).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connect);

        let err = StreamListener::with_address("::1", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bind);

        let err = DatagramEndpoint::with_address("::1", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bind);
    }
    assert_eq!(open_descriptors(), before);
}
