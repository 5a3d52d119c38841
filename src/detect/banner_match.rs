//! Banner-pattern confirmation for protocols where the server speaks first.

use super::{Detector, ProbeContext};
use crate::banner::{read_banner, DEFAULT_BANNER_CAP};
use crate::error::{ConfigError, ConfigResult};
use crate::services::Service;
use async_trait::async_trait;
use regex::bytes::Regex;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Confirms a service when its greeting matches a pattern.
///
/// Uses the banner the prober already captured. When that is empty the
/// detector waits once more, up to its own read timeout, for a late greeting.
#[derive(Debug, Clone)]
pub struct BannerDetector {
    service: Service,
    pattern: Regex,
    read_timeout: Duration,
}

impl BannerDetector {
    pub fn new(service: Service, pattern: &str) -> ConfigResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            service: service.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            service,
            pattern,
            read_timeout: Duration::from_secs(1),
        })
    }

    /// SSH identification string, e.g. `SSH-2.0-OpenSSH_9.6`.
    pub fn ssh() -> Self {
        Self {
            service: Service::Ssh,
            pattern: Regex::new(r"^SSH-\d+\.\d+-").expect("static SSH pattern is valid"),
            read_timeout: Duration::from_secs(1),
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    fn matches(&self, banner: &[u8]) -> bool {
        self.pattern.is_match(banner)
    }
}

#[async_trait]
impl Detector for BannerDetector {
    fn name(&self) -> &str {
        self.service.as_str()
    }

    async fn confirm(&self, stream: &mut TcpStream, ctx: &ProbeContext<'_>) -> Option<Service> {
        if !ctx.banner.is_empty() {
            return self.matches(ctx.banner).then_some(self.service);
        }

        let late = read_banner(stream, self.read_timeout, DEFAULT_BANNER_CAP).await;
        if self.matches(&late) {
            debug!(address = %ctx.address, service = %self.service, "confirmed from late banner");
            Some(self.service)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Port, TransportAddress};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_ssh_pattern() {
        let detector = BannerDetector::ssh();
        assert!(detector.matches(b"SSH-2.0-OpenSSH_9.6p1 Ubuntu-3ubuntu13\r\n"));
        assert!(detector.matches(b"SSH-1.99-Cisco-1.25\r\n"));
        assert!(!detector.matches(b"220 ProFTPD Server ready\r\n"));
        assert!(!detector.matches(b""));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            BannerDetector::new(Service::Ftp, "(unclosed"),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(BannerDetector::new(Service::Ftp, r"^220[ -]").is_ok());
    }

    #[tokio::test]
    async fn test_uses_captured_banner_without_reading() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let local = listener.local_addr().unwrap();
        let mut stream = TcpStream::connect(local).await.unwrap();

        let detector = BannerDetector::ssh().with_read_timeout(Duration::from_secs(5));
        let ctx = ProbeContext {
            address: TransportAddress::new(local.ip(), Port::new(local.port()).unwrap()),
            banner: b"SSH-2.0-dropbear\r\n",
        };

        let start = std::time::Instant::now();
        assert_eq!(detector.confirm(&mut stream, &ctx).await, Some(Service::Ssh));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_reads_late_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let local = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = socket.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await;
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let mut stream = TcpStream::connect(local).await.unwrap();
        let detector = BannerDetector::ssh().with_read_timeout(Duration::from_secs(2));
        let ctx = ProbeContext {
            address: TransportAddress::new(local.ip(), Port::new(local.port()).unwrap()),
            banner: &[],
        };

        assert_eq!(detector.confirm(&mut stream, &ctx).await, Some(Service::Ssh));
    }
}
