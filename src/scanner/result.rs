//! Per-port scan results.

use crate::banner::sanitize_banner;
use crate::services::{self, Service};
use crate::types::{Port, TransportAddress};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a connection attempt to a port ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PortOutcome {
    /// The attempt failed for a reason other than refusal (timeout,
    /// unreachable host, network error). The port may be firewalled.
    Unknown { error: String },
    /// The remote stack explicitly refused the connection.
    Closed,
    /// A connection was established.
    Open,
}

impl PortOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown { .. } => "unknown",
            Self::Closed => "closed",
            Self::Open => "open",
        }
    }
}

impl fmt::Display for PortOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of probing a single transport address.
///
/// Built once when the probe finishes. `Closed` and `Unknown` results never
/// carry a banner or a confirmed service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub address: TransportAddress,
    /// When the probe started.
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: PortOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub banner: Vec<u8>,
    /// Catalog guesses for this port number. Never verified.
    #[serde(default)]
    pub potential_services: Vec<Service>,
    /// Service verified by a detector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_service: Option<Service>,
    /// Connect latency in milliseconds, set for open ports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl ScanResult {
    fn base(address: TransportAddress, at: DateTime<Utc>, outcome: PortOutcome) -> Self {
        Self {
            address,
            at,
            outcome,
            banner: Vec::new(),
            potential_services: services::potential_services(address.port().as_u16()).to_vec(),
            confirmed_service: None,
            response_time_ms: None,
        }
    }

    /// Result for an explicitly refused connection.
    pub fn closed(address: TransportAddress, at: DateTime<Utc>) -> Self {
        Self::base(address, at, PortOutcome::Closed)
    }

    /// Result for an ambiguous connection failure.
    pub fn unknown(address: TransportAddress, at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self::base(
            address,
            at,
            PortOutcome::Unknown {
                error: error.into(),
            },
        )
    }

    /// Result for an established connection.
    pub fn open(
        address: TransportAddress,
        at: DateTime<Utc>,
        banner: Vec<u8>,
        confirmed_service: Option<Service>,
    ) -> Self {
        Self {
            banner,
            confirmed_service,
            ..Self::base(address, at, PortOutcome::Open)
        }
    }

    pub fn with_response_time(mut self, time_ms: u64) -> Self {
        self.response_time_ms = Some(time_ms);
        self
    }

    pub fn port(&self) -> Port {
        self.address.port()
    }

    pub fn is_open(&self) -> bool {
        self.outcome == PortOutcome::Open
    }

    /// Open ports deserve a user's attention; everything else is routine.
    pub fn is_interesting(&self) -> bool {
        self.is_open()
    }

    /// Connection failure cause for `Unknown` results.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            PortOutcome::Unknown { error } => Some(error),
            _ => None,
        }
    }

    /// Printable rendering of the banner.
    pub fn banner_text(&self) -> String {
        sanitize_banner(&self.banner)
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address, self.outcome)?;
        if !self.banner.is_empty() {
            write!(f, " [{}]", self.banner_text())?;
        }
        if let Some(service) = self.confirmed_service {
            write!(f, " {}", service)?;
        }
        Ok(())
    }
}
