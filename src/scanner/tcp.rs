//! TCP connect attempts.
//!
//! Performs standard TCP connect scans using the operating system's socket
//! API. No special privileges are needed; the full handshake is completed
//! and the stream dropped immediately.

use crate::error::{ScanError, ScanResult};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddrV4;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Something that can attempt a connection to one address.
///
/// `Ok(())` means the port accepted the connection.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, target: SocketAddrV4, timeout: Duration) -> ScanResult<()>;
}

/// Connector backed by `tokio::net::TcpStream`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, target: SocketAddrV4, limit: Duration) -> ScanResult<()> {
        match timeout(limit, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                Ok(())
            }
            Ok(Err(e)) => Err(classify_io_error(target, &e)),
            Err(_) => Err(ScanError::Timeout),
        }
    }
}

/// Map a failed connect onto the scan error taxonomy.
pub fn classify_io_error(target: SocketAddrV4, e: &io::Error) -> ScanError {
    if is_resource_exhaustion(e) {
        return ScanError::ResourceExhausted(e.to_string());
    }

    if e.kind() == io::ErrorKind::ConnectionRefused {
        return ScanError::ConnectionRefused;
    }

    let error_str = e.to_string().to_lowercase();
    if error_str.contains("refused") {
        ScanError::ConnectionRefused
    } else if error_str.contains("unreachable") {
        if error_str.contains("host") {
            ScanError::HostUnreachable
        } else {
            ScanError::NetworkUnreachable(e.to_string())
        }
    } else {
        ScanError::ConnectionFailed {
            target: *target.ip(),
            port: target.port(),
            reason: e.to_string(),
        }
    }
}

/// Out of descriptors, buffers or ephemeral ports.
#[cfg(unix)]
fn is_resource_exhaustion(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::EMFILE) | Some(libc::ENFILE) | Some(libc::ENOBUFS) | Some(libc::EADDRNOTAVAIL)
    )
}

#[cfg(not(unix))]
fn is_resource_exhaustion(_e: &io::Error) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    fn target(port: u16) -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)
    }

    #[tokio::test]
    async fn test_connect_to_listener_succeeds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = TcpConnector::new()
            .connect(target(port), Duration::from_secs(1))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        // Bind then drop so the port is known to be free.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = TcpConnector::new()
            .connect(target(port), Duration::from_millis(500))
            .await;
        assert!(result.is_err());
        assert!(!result.unwrap_err().is_host_fatal());
    }

    #[test]
    fn test_classify_refused() {
        let e = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert!(matches!(
            classify_io_error(target(80), &e),
            ScanError::ConnectionRefused
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_descriptor_exhaustion() {
        let e = io::Error::from_raw_os_error(libc::EMFILE);
        let err = classify_io_error(target(80), &e);
        assert!(matches!(err, ScanError::ResourceExhausted(_)));
        assert!(err.is_host_fatal());
    }

    #[test]
    fn test_classify_other_failure_keeps_target() {
        let e = io::Error::new(io::ErrorKind::Other, "something odd");
        match classify_io_error(target(8080), &e) {
            ScanError::ConnectionFailed { target, port, .. } => {
                assert_eq!(target, Ipv4Addr::LOCALHOST);
                assert_eq!(port, 8080);
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
