//! Scan observers.
//!
//! The orchestrator reports every finished probe to an observer. Observers
//! only watch: nothing they do changes how the scan proceeds.

use crate::scanner::result::{PortOutcome, ScanResult};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Receives scan notifications.
pub trait ScanObserver: Send + Sync {
    /// Called once for every probed port.
    fn on_result(&self, _result: &ScanResult) {}

    /// Called, after `on_result`, for ports whose connection attempt failed
    /// ambiguously.
    fn on_failure(&self, _result: &ScanResult, _error: &str) {}
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Logs results through `tracing`: open ports at `info`, routine closed and
/// failed ports at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn on_result(&self, result: &ScanResult) {
        match result.outcome {
            PortOutcome::Open => info!("{}", result),
            PortOutcome::Closed => debug!("{}", result),
            PortOutcome::Unknown { .. } => {}
        }
    }

    fn on_failure(&self, result: &ScanResult, error: &str) {
        debug!(address = %result.address, %error, "scan TCP");
    }
}

/// Forwards every result over an unbounded channel.
///
/// Sending never blocks the scan; results are dropped once the receiver is
/// gone.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ScanResult>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ScanObserver for ChannelObserver {
    fn on_result(&self, result: &ScanResult) {
        let _ = self.tx.send(result.clone());
    }
}

/// Drives a terminal progress bar.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Scan complete");
    }
}

impl ScanObserver for ProgressObserver {
    fn on_result(&self, result: &ScanResult) {
        self.bar.inc(1);
        if result.is_interesting() {
            self.bar.set_message(format!("Found open port: {}", result.port()));
        }
    }
}

/// Fans notifications out to several observers.
impl<A: ScanObserver, B: ScanObserver> ScanObserver for (A, B) {
    fn on_result(&self, result: &ScanResult) {
        self.0.on_result(result);
        self.1.on_result(result);
    }

    fn on_failure(&self, result: &ScanResult, error: &str) {
        self.0.on_failure(result, error);
        self.1.on_failure(result, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Port, TransportAddress};
    use chrono::Utc;
    use std::io;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::{Arc, Mutex};
    use tracing::Level;

    fn addr(port: u16) -> TransportAddress {
        TransportAddress::new(IpAddr::V4(Ipv4Addr::LOCALHOST), Port::new(port).unwrap())
    }

    #[tokio::test]
    async fn test_channel_observer_forwards() {
        let (observer, mut rx) = ChannelObserver::new();
        observer.on_result(&ScanResult::closed(addr(22), Utc::now()));
        observer.on_result(&ScanResult::open(addr(80), Utc::now(), Vec::new(), None));
        drop(observer);

        let mut ports = Vec::new();
        while let Some(result) = rx.recv().await {
            ports.push(result.port().as_u16());
        }
        assert_eq!(ports, vec![22, 80]);
    }

    #[test]
    fn test_channel_observer_without_receiver() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        observer.on_result(&ScanResult::closed(addr(22), Utc::now()));
    }

    #[test]
    fn test_progress_observer_counts() {
        let observer = ProgressObserver::new(2);
        observer.on_result(&ScanResult::closed(addr(22), Utc::now()));
        observer.on_result(&ScanResult::open(addr(80), Utc::now(), Vec::new(), None));
        assert_eq!(observer.bar.position(), 2);
        observer.finish();
    }

    /// Shared buffer a test subscriber writes into.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged_at(level: Level, report: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, report);

        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_tracing_observer_keeps_routine_ports_quiet() {
        let failed = ScanResult::unknown(addr(81), Utc::now(), "timed out");
        let closed = ScanResult::closed(addr(82), Utc::now());
        let report = || {
            let observer = (TracingObserver, NoopObserver);
            observer.on_result(&failed);
            observer.on_failure(&failed, "timed out");
            observer.on_result(&closed);
        };

        assert_eq!(logged_at(Level::WARN, report), "");

        let debug = logged_at(Level::DEBUG, report);
        assert!(debug.contains("timed out"));
        assert!(debug.contains("127.0.0.1:82 (closed)"));
    }

    #[test]
    fn test_tracing_observer_reports_open_ports() {
        let open = ScanResult::open(addr(80), Utc::now(), Vec::new(), None);
        let info = logged_at(Level::INFO, || TracingObserver.on_result(&open));
        assert!(info.contains("127.0.0.1:80 (open)"));
    }
}
