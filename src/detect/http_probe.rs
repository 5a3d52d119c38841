//! HTTP confirmation.
//!
//! Sends `GET /` with a virtual host and a plausible user agent, then expects
//! a well-formed HTTP/1.x response head.

use super::user_agent::random_user_agent;
use super::{Detector, ProbeContext};
use crate::error::{ConfigError, ConfigResult};
use crate::services::Service;
use async_trait::async_trait;
use http::header::{HOST, USER_AGENT};
use http::{HeaderName, HeaderValue, Request, StatusCode};
use std::io;
use std::net::Ipv6Addr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Default deadline for sending the request.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default deadline for receiving the response head.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Largest response head we are willing to buffer.
const MAX_RESPONSE_HEAD: usize = 8 * 1024;

/// Confirms HTTP by completing one request/response exchange.
#[derive(Debug, Clone)]
pub struct HttpDetector {
    virtual_host: HeaderValue,
    user_agent: Option<HeaderValue>,
    write_timeout: Duration,
    read_timeout: Duration,
}

impl HttpDetector {
    /// Create an HTTP detector for `virtual_host`.
    ///
    /// Without a user-agent override every request draws one from the sample
    /// pool. An empty host is rejected here rather than producing silently
    /// unconfirmed ports later.
    pub fn new(virtual_host: impl Into<String>, user_agent: Option<String>) -> ConfigResult<Self> {
        let host = virtual_host.into();
        let host = host.trim();
        if host.is_empty() {
            return Err(ConfigError::MissingVirtualHost);
        }

        // IPv6 literals need brackets in a Host header
        let host = match host.parse::<Ipv6Addr>() {
            Ok(ip) => format!("[{}]", ip),
            Err(_) => host.to_string(),
        };

        let virtual_host =
            HeaderValue::from_str(&host).map_err(|_| ConfigError::InvalidHeader {
                name: "Host",
                value: host.clone(),
            })?;

        let user_agent = user_agent
            .filter(|ua| !ua.trim().is_empty())
            .map(|ua| {
                HeaderValue::from_str(&ua).map_err(|_| ConfigError::InvalidHeader {
                    name: "User-Agent",
                    value: ua,
                })
            })
            .transpose()?;

        Ok(Self {
            virtual_host,
            user_agent,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    fn build_request(&self) -> Request<()> {
        let user_agent = self
            .user_agent
            .clone()
            .unwrap_or_else(|| HeaderValue::from_static(random_user_agent()));

        // Request::new is GET / HTTP/1.1
        let mut request = Request::new(());
        request.headers_mut().insert(HOST, self.virtual_host.clone());
        request.headers_mut().insert(USER_AGENT, user_agent);
        request
    }
}

/// Serialize a bodiless request in HTTP/1.x wire format.
fn encode_request(request: &Request<()>) -> Vec<u8> {
    let mut out = format!(
        "{} {} {:?}\r\n",
        request.method(),
        request.uri(),
        request.version()
    )
    .into_bytes();

    for (name, value) in request.headers() {
        out.extend_from_slice(canonical_name(name).as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
    out
}

/// `user-agent` -> `User-Agent`
fn canonical_name(name: &HeaderName) -> String {
    name.as_str()
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Offset just past the blank line ending a header block.
fn head_end(buf: &[u8]) -> Option<usize> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4);
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| i + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Read until a complete response head has arrived.
async fn read_response_head<R>(stream: &mut R, limit: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut head = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before end of response head",
            ));
        }
        head.extend_from_slice(&chunk[..n]);

        if let Some(end) = head_end(&head) {
            head.truncate(end);
            return Ok(head);
        }
        if head.len() > limit {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "response head too large",
            ));
        }
    }
}

/// Validate a response head and return its status code.
fn parse_response_head(head: &[u8]) -> Option<StatusCode> {
    let text = std::str::from_utf8(head).ok()?;
    let mut lines = text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

    let status_line = lines.next()?;
    let (version, rest) = status_line.split_once(' ')?;
    if !is_http1_version(version) {
        return None;
    }

    let rest = rest.trim_start();
    let code = rest.get(..3)?;
    if !rest[3..].is_empty() && !rest[3..].starts_with(' ') {
        return None;
    }
    let status = StatusCode::from_bytes(code.as_bytes()).ok()?;

    for line in lines.take_while(|line| !line.is_empty()) {
        let (name, value) = line.split_once(':')?;
        HeaderName::from_bytes(name.as_bytes()).ok()?;
        HeaderValue::from_str(value.trim()).ok()?;
    }

    Some(status)
}

fn is_http1_version(version: &str) -> bool {
    let Some(numbers) = version.strip_prefix("HTTP/") else {
        return false;
    };
    matches!(numbers.as_bytes(), [b'1', b'.', minor] if minor.is_ascii_digit())
}

#[async_trait]
impl Detector for HttpDetector {
    fn name(&self) -> &str {
        "http"
    }

    async fn confirm(&self, stream: &mut TcpStream, ctx: &ProbeContext<'_>) -> Option<Service> {
        let request = encode_request(&self.build_request());

        match timeout(self.write_timeout, stream.write_all(&request)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(address = %ctx.address, error = %e, "HTTP request write failed");
                return None;
            }
            Err(_) => {
                debug!(address = %ctx.address, "HTTP request write timed out");
                return None;
            }
        }

        let head = match timeout(self.read_timeout, read_response_head(stream, MAX_RESPONSE_HEAD)).await {
            Ok(Ok(head)) => head,
            Ok(Err(e)) => {
                debug!(address = %ctx.address, error = %e, "no HTTP response");
                return None;
            }
            Err(_) => {
                debug!(address = %ctx.address, "HTTP response timed out");
                return None;
            }
        };

        let status = parse_response_head(&head)?;
        debug!(address = %ctx.address, %status, "HTTP confirmed");
        Some(Service::Http)
    }
}
