//! Active service detectors.
//!
//! A detector runs against a connection the prober has already opened and
//! either confirms one service or reports nothing. Detectors are tried in the
//! order they are configured and the first confirmation wins.

mod banner_match;
mod http_probe;
pub mod user_agent;

pub use self::banner_match::BannerDetector;
pub use self::http_probe::HttpDetector;

use crate::config::ScanSettings;
use crate::error::ConfigResult;
use crate::services::Service;
use crate::types::TransportAddress;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::net::TcpStream;

/// What a detector knows about the connection it is handed.
#[derive(Debug, Clone, Copy)]
pub struct ProbeContext<'a> {
    pub address: TransportAddress,
    /// Bytes the service sent unprompted, possibly empty.
    pub banner: &'a [u8],
}

/// An active probe confirming one application protocol.
///
/// Implementations enforce their own read and write deadlines and must leave
/// the stream in a state the caller can still close. Not confirming is the
/// normal answer for most ports and is never an error.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Try to confirm a service over `stream`.
    async fn confirm(&self, stream: &mut TcpStream, ctx: &ProbeContext<'_>) -> Option<Service>;
}

/// A shared detector for dynamic dispatch.
pub type SharedDetector = Arc<dyn Detector>;

/// Built-in detector selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Send a GET request and expect an HTTP response.
    Http,
    /// Match an SSH identification string.
    Ssh,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Ssh => write!(f, "ssh"),
        }
    }
}

/// Build the ordered detector list.
///
/// Built-in detectors come first, in `kinds` order, followed by the banner
/// rules from `settings`. Fails when a detector cannot be configured, e.g.
/// HTTP detection without a virtual host or a malformed banner pattern.
pub fn build_detectors(
    kinds: &[DetectorKind],
    settings: &ScanSettings,
    virtual_host: &str,
) -> ConfigResult<Vec<SharedDetector>> {
    let mut detectors = kinds
        .iter()
        .map(|kind| -> ConfigResult<SharedDetector> {
            Ok(match kind {
                DetectorKind::Http => Arc::new(
                    HttpDetector::new(virtual_host, settings.user_agent.clone())?
                        .with_write_timeout(settings.detector_write_timeout())
                        .with_read_timeout(settings.detector_read_timeout()),
                ),
                DetectorKind::Ssh => {
                    Arc::new(BannerDetector::ssh().with_read_timeout(settings.detector_read_timeout()))
                }
            })
        })
        .collect::<ConfigResult<Vec<_>>>()?;

    for rule in &settings.banner_patterns {
        let detector = BannerDetector::new(rule.service, &rule.pattern)?
            .with_read_timeout(settings.detector_read_timeout());
        detectors.push(Arc::new(detector));
    }

    Ok(detectors)
}
