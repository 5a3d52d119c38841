//! Single-port TCP prober.
//!
//! Performs a full TCP connect, classifies the outcome, captures any banner
//! and runs the configured detectors against the live connection.

use crate::banner::{read_banner, DEFAULT_BANNER_CAP, DEFAULT_BANNER_TIMEOUT};
use crate::detect::{ProbeContext, SharedDetector};
use crate::scanner::result::ScanResult;
use crate::types::TransportAddress;
use chrono::Utc;
use std::io;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::error::Elapsed;
use tokio::time::timeout;
use tracing::{debug, trace};

/// Connect timeout used when none (or zero) is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// How a connection attempt failed.
#[derive(Debug)]
enum ConnectFailure {
    /// Explicit refusal: the port is closed.
    Refused,
    /// Anything else: timeout, unreachable, network error.
    Other(String),
}

/// Sort a timed connect attempt into success, refusal or anything else.
///
/// Only an explicit refusal means closed. Timeouts and unreachable hosts or
/// networks are ambiguous: the port may sit behind a filtering firewall.
fn classify_connect<S>(
    attempt: Result<io::Result<S>, Elapsed>,
    connect_timeout: Duration,
) -> Result<S, ConnectFailure> {
    match attempt {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => Err(ConnectFailure::Refused),
        Ok(Err(e)) => Err(ConnectFailure::Other(e.to_string())),
        Err(_) => Err(ConnectFailure::Other(format!(
            "connection timed out after {}ms",
            connect_timeout.as_millis()
        ))),
    }
}

/// Probes one transport address at a time.
///
/// Cheap to share behind an `Arc`; holds no per-probe state.
#[derive(Clone)]
pub struct TcpProber {
    connect_timeout: Duration,
    banner_timeout: Duration,
    banner_cap: usize,
    detectors: Vec<SharedDetector>,
}

impl TcpProber {
    /// Create a prober. A zero `connect_timeout` falls back to one second.
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout: if connect_timeout.is_zero() {
                DEFAULT_CONNECT_TIMEOUT
            } else {
                connect_timeout
            },
            banner_timeout: DEFAULT_BANNER_TIMEOUT,
            banner_cap: DEFAULT_BANNER_CAP,
            detectors: Vec::new(),
        }
    }

    pub fn with_banner_timeout(mut self, banner_timeout: Duration) -> Self {
        self.banner_timeout = banner_timeout;
        self
    }

    pub fn with_banner_cap(mut self, banner_cap: usize) -> Self {
        self.banner_cap = banner_cap;
        self
    }

    /// Detectors run in the given order; the first confirmation wins.
    pub fn with_detectors(mut self, detectors: Vec<SharedDetector>) -> Self {
        self.detectors = detectors;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn banner_cap(&self) -> usize {
        self.banner_cap
    }

    async fn attempt_connect(&self, addr: TransportAddress) -> Result<TcpStream, ConnectFailure> {
        let attempt = timeout(self.connect_timeout, TcpStream::connect(addr.socket_addr())).await;
        classify_connect(attempt, self.connect_timeout)
    }

    /// Probe a single address. Never fails: failures are encoded in the
    /// result's outcome.
    pub async fn probe(&self, addr: TransportAddress) -> ScanResult {
        let at = Utc::now();
        let start = Instant::now();

        let mut stream = match self.attempt_connect(addr).await {
            Ok(stream) => stream,
            Err(ConnectFailure::Refused) => {
                trace!(%addr, "connection refused");
                return ScanResult::closed(addr, at);
            }
            Err(ConnectFailure::Other(reason)) => {
                debug!(%addr, %reason, "connection failed");
                return ScanResult::unknown(addr, at, reason);
            }
        };
        let response_time = start.elapsed().as_millis() as u64;

        let banner = read_banner(&mut stream, self.banner_timeout, self.banner_cap).await;
        if !banner.is_empty() {
            debug!(%addr, bytes = banner.len(), "captured banner");
        }

        let ctx = ProbeContext {
            address: addr,
            banner: &banner,
        };
        let mut confirmed = None;
        for detector in &self.detectors {
            if let Some(service) = detector.confirm(&mut stream, &ctx).await {
                debug!(%addr, detector = detector.name(), %service, "service confirmed");
                confirmed = Some(service);
                break;
            }
        }

        // Best effort; dropping the stream closes it regardless.
        let _ = stream.shutdown().await;

        ScanResult::open(addr, at, banner, confirmed).with_response_time(response_time)
    }
}
