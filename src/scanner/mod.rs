//! Scanner module - drives the single-port prober across a port list.
//!
//! Probes for distinct ports run concurrently up to a configurable limit.
//! Every requested port yields exactly one [`ScanResult`], whatever happened
//! to it, and the final [`HostReport`] is sorted by port.

pub mod observer;
pub mod result;
pub mod tcp;

use crate::types::{Port, TransportAddress};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use observer::{ChannelObserver, NoopObserver, ProgressObserver, ScanObserver, TracingObserver};
pub use result::{PortOutcome, ScanResult};
pub use tcp::{TcpProber, DEFAULT_CONNECT_TIMEOUT};

/// Failure cause recorded for ports cut off by cancellation.
pub const CANCELLED: &str = "scan cancelled";

/// Failure cause recorded for ports cut off by the scan deadline.
pub const DEADLINE_EXCEEDED: &str = "scan deadline exceeded";

/// Upper bound on simultaneous probes.
pub const MAX_CONCURRENCY: usize = 5_000;

/// How a port range is driven.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum number of probes in flight.
    pub concurrency: usize,
    /// Overall time budget for the whole range.
    pub scan_deadline: Option<Duration>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            concurrency: 100,
            scan_deadline: None,
        }
    }
}

impl ScanOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.scan_deadline = Some(deadline);
        self
    }
}

/// All results for one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostReport {
    /// Hostname the address was resolved from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// PTR name of `ip`, when a reverse lookup was requested and answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_name: Option<String>,
    pub ip: IpAddr,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub ports_scanned: usize,
    /// One entry per requested port, sorted by port.
    pub results: Vec<ScanResult>,
}

impl HostReport {
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_reverse_name(mut self, name: impl Into<String>) -> Self {
        self.reverse_name = Some(name.into());
        self
    }

    pub fn open_count(&self) -> usize {
        self.count(|o| matches!(o, PortOutcome::Open))
    }

    pub fn closed_count(&self) -> usize {
        self.count(|o| matches!(o, PortOutcome::Closed))
    }

    pub fn unknown_count(&self) -> usize {
        self.count(|o| matches!(o, PortOutcome::Unknown { .. }))
    }

    fn count(&self, pred: impl Fn(&PortOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// Results worth surfacing to a user.
    pub fn interesting(&self) -> impl Iterator<Item = &ScanResult> {
        self.results.iter().filter(|r| r.is_interesting())
    }

    /// Result for a specific port.
    pub fn get(&self, port: u16) -> Option<&ScanResult> {
        self.results
            .binary_search_by_key(&port, |r| r.port().as_u16())
            .ok()
            .map(|i| &self.results[i])
    }
}

/// Resolves once `deadline` passes, never when there is none.
async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Probe `ports` on `ip` and collect one result per port.
///
/// Never aborts early on a failing port. Cancelling `cancel` or exceeding the
/// scan deadline stops in-flight probes promptly; the affected ports are
/// reported as [`PortOutcome::Unknown`].
pub async fn scan_ports(
    ip: IpAddr,
    ports: &[Port],
    prober: &TcpProber,
    options: &ScanOptions,
    observer: &dyn ScanObserver,
    cancel: &CancellationToken,
) -> HostReport {
    let started_at = Utc::now();
    let start = Instant::now();
    let deadline = options.scan_deadline.map(|d| start + d);
    let concurrency = options.concurrency.clamp(1, MAX_CONCURRENCY);

    debug!(%ip, ports = ports.len(), concurrency, "starting port scan");

    let mut results: Vec<ScanResult> = stream::iter(ports.iter().copied())
        .map(|port| {
            let addr = TransportAddress::new(ip, port);
            async move {
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => ScanResult::unknown(addr, Utc::now(), CANCELLED),
                    _ = deadline_reached(deadline) => {
                        ScanResult::unknown(addr, Utc::now(), DEADLINE_EXCEEDED)
                    }
                    result = prober.probe(addr) => result,
                };

                observer.on_result(&result);
                if let Some(error) = result.error() {
                    observer.on_failure(&result, error);
                }
                result
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    results.sort_by_key(|r| r.port());

    let report = HostReport {
        hostname: None,
        reverse_name: None,
        ip,
        started_at,
        duration_ms: start.elapsed().as_millis() as u64,
        ports_scanned: ports.len(),
        results,
    };

    info!(
        %ip,
        scanned = report.ports_scanned,
        open = report.open_count(),
        closed = report.closed_count(),
        unknown = report.unknown_count(),
        duration_ms = report.duration_ms,
        "port scan finished"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    /// Listeners that complete the handshake but never speak.
    async fn silent_ports(n: usize) -> (Vec<TcpListener>, Vec<Port>) {
        let mut listeners = Vec::new();
        let mut ports = Vec::new();
        for _ in 0..n {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            ports.push(Port::new(listener.local_addr().unwrap().port()).unwrap());
            listeners.push(listener);
        }
        (listeners, ports)
    }

    #[derive(Default)]
    struct Counting {
        results: AtomicUsize,
        failures: AtomicUsize,
    }

    impl ScanObserver for Counting {
        fn on_result(&self, _: &ScanResult) {
            self.results.fetch_add(1, Ordering::SeqCst);
        }

        fn on_failure(&self, _: &ScanResult, _: &str) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_default_options() {
        let options = ScanOptions::default();
        assert_eq!(options.concurrency, 100);
        assert!(options.scan_deadline.is_none());
    }

    #[tokio::test]
    async fn test_every_port_reported_in_order() {
        let (_open, open_ports) = silent_ports(2).await;
        let (closed, closed_ports) = silent_ports(2).await;
        drop(closed);

        let mut ports: Vec<Port> = open_ports.iter().chain(&closed_ports).copied().collect();
        ports.reverse();

        let prober = TcpProber::new(Duration::from_secs(1)).with_banner_timeout(Duration::from_millis(50));
        let report = scan_ports(
            LOCALHOST,
            &ports,
            &prober,
            &ScanOptions::default(),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(report.results.len(), 4);
        assert_eq!(report.ports_scanned, 4);
        assert!(report.results.windows(2).all(|w| w[0].port() < w[1].port()));
        assert_eq!(report.open_count(), 2);
        assert_eq!(report.closed_count(), 2);
        assert_eq!(report.interesting().count(), 2);

        for port in &open_ports {
            assert!(report.get(port.as_u16()).unwrap().is_open());
        }
        for port in &closed_ports {
            assert_eq!(report.get(port.as_u16()).unwrap().outcome, PortOutcome::Closed);
        }
    }

    #[tokio::test]
    async fn test_concurrent_probes_overlap() {
        let (_listeners, ports) = silent_ports(3).await;
        let banner_wait = Duration::from_millis(400);
        let prober = TcpProber::new(Duration::from_millis(500)).with_banner_timeout(banner_wait);

        let start = std::time::Instant::now();
        let report = scan_ports(
            LOCALHOST,
            &ports,
            &prober,
            &ScanOptions::default().with_concurrency(3),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await;
        let concurrent = start.elapsed();

        assert_eq!(report.open_count(), 3);
        assert!(concurrent < banner_wait * 2, "took {:?}", concurrent);

        let start = std::time::Instant::now();
        scan_ports(
            LOCALHOST,
            &ports,
            &prober,
            &ScanOptions::default().with_concurrency(1),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await;
        assert!(start.elapsed() >= banner_wait * 3);
    }

    #[tokio::test]
    async fn test_cancelled_scan_still_reports_every_port() {
        let (_listeners, ports) = silent_ports(3).await;
        let prober = TcpProber::new(Duration::from_secs(1)).with_banner_timeout(Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let observer = Counting::default();
        let report = scan_ports(
            LOCALHOST,
            &ports,
            &prober,
            &ScanOptions::default(),
            &observer,
            &cancel,
        )
        .await;

        assert_eq!(report.results.len(), 3);
        assert!(report.results.iter().all(|r| r.error() == Some(CANCELLED)));
        assert_eq!(observer.results.load(Ordering::SeqCst), 3);
        assert_eq!(observer.failures.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_deadline_stops_in_flight_probes() {
        let (_listeners, ports) = silent_ports(2).await;
        let prober = TcpProber::new(Duration::from_secs(1)).with_banner_timeout(Duration::from_secs(10));

        let start = std::time::Instant::now();
        let report = scan_ports(
            LOCALHOST,
            &ports,
            &prober,
            &ScanOptions::default().with_deadline(Duration::from_millis(200)),
            &NoopObserver,
            &CancellationToken::new(),
        )
        .await;

        assert!(start.elapsed() < Duration::from_secs(3));
        assert!(report.results.iter().all(|r| r.error() == Some(DEADLINE_EXCEEDED)));
        assert_eq!(report.unknown_count(), 2);
    }

    #[tokio::test]
    async fn test_observer_sees_every_result() {
        let (_listeners, mut ports) = silent_ports(1).await;
        let (closed, closed_ports) = silent_ports(1).await;
        drop(closed);
        ports.extend(closed_ports);

        let (observer, mut rx) = ChannelObserver::new();
        let prober = TcpProber::new(Duration::from_secs(1)).with_banner_timeout(Duration::from_millis(50));
        scan_ports(
            LOCALHOST,
            &ports,
            &prober,
            &ScanOptions::default(),
            &observer,
            &CancellationToken::new(),
        )
        .await;
        drop(observer);

        let mut seen = 0;
        while rx.recv().await.is_some() {
            seen += 1;
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_report_serialization() {
        let report = HostReport {
            hostname: Some("example.com".into()),
            reverse_name: None,
            ip: LOCALHOST,
            started_at: Utc::now(),
            duration_ms: 12,
            ports_scanned: 1,
            results: vec![ScanResult::closed(
                TransportAddress::new(LOCALHOST, Port::new(22).unwrap()),
                Utc::now(),
            )],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["hostname"], "example.com");
        assert!(json.get("reverse_name").is_none());
        assert_eq!(json["results"][0]["state"], "closed");

        let parsed: HostReport = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(parsed.closed_count(), 1);

        let named = parsed.with_reverse_name("localhost");
        assert_eq!(serde_json::to_value(&named).unwrap()["reverse_name"], "localhost");

        let mut zero_port = json;
        zero_port["results"][0]["address"]["port"] = 0.into();
        assert!(serde_json::from_value::<HostReport>(zero_port).is_err());
    }
}
