//! Passive banner capture for TCP connections.
//!
//! Reads whatever a service volunteers right after the handshake, before any
//! request is sent.

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

/// Default upper bound on captured banner bytes.
pub const DEFAULT_BANNER_CAP: usize = 512;

/// Default time to wait for unsolicited data.
pub const DEFAULT_BANNER_TIMEOUT: Duration = Duration::from_secs(1);

/// Wait up to `window` for unsolicited bytes and return at most `cap` of them.
///
/// A single read is performed. Timeouts, EOF and read errors all yield an
/// empty banner: a silent service is not a failure.
pub async fn read_banner<R>(stream: &mut R, window: Duration, cap: usize) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    if cap == 0 {
        return Vec::new();
    }

    let mut buffer = vec![0u8; cap];
    match timeout(window, stream.read(&mut buffer)).await {
        Ok(Ok(n)) => {
            buffer.truncate(n);
            buffer
        }
        _ => Vec::new(),
    }
}

/// Render banner bytes for display.
///
/// Control bytes become `.`, line breaks and tabs become spaces, runs of
/// spaces are collapsed and the result is trimmed.
pub fn sanitize_banner(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len());
    let mut prev_space = false;

    for &b in data {
        let c = if b.is_ascii_graphic() {
            b as char
        } else if matches!(b, b' ' | b'\r' | b'\n' | b'\t') {
            ' '
        } else {
            '.'
        };

        if c == ' ' {
            if !prev_space {
                result.push(c);
            }
            prev_space = true;
        } else {
            result.push(c);
            prev_space = false;
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_banner() {
        let data = b"SSH-2.0-OpenSSH_8.9\r\n";
        assert_eq!(sanitize_banner(data), "SSH-2.0-OpenSSH_8.9");
    }

    #[test]
    fn test_sanitize_binary_data() {
        let data = b"\x00\x01Hello\x02World\x03";
        assert_eq!(sanitize_banner(data), "..Hello.World.");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        let data = b"220  mail.example.com\r\n\r\nESMTP\t ready ";
        assert_eq!(sanitize_banner(data), "220 mail.example.com ESMTP ready");
    }

    #[tokio::test]
    async fn test_read_banner_respects_cap() {
        let (mut client, mut server) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut server, b"0123456789")
            .await
            .unwrap();

        let banner = read_banner(&mut client, Duration::from_millis(200), 4).await;
        assert_eq!(banner, b"0123");
    }

    #[tokio::test]
    async fn test_read_banner_silent_peer() {
        let (mut client, _server) = tokio::io::duplex(64);
        let banner = read_banner(&mut client, Duration::from_millis(50), 16).await;
        assert!(banner.is_empty());
    }

    #[tokio::test]
    async fn test_read_banner_closed_peer() {
        let (mut client, server) = tokio::io::duplex(64);
        drop(server);
        let banner = read_banner(&mut client, Duration::from_millis(50), 16).await;
        assert!(banner.is_empty());
    }
}
