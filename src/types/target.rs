//! Target specification types.
//!
//! A target is either an IP literal or a hostname. Hostnames are resolved to
//! a single address; the name itself is kept as the HTTP virtual host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A scan target that has been resolved to an IP address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTarget {
    /// The original input (hostname or IP string).
    pub original: String,
    /// The resolved IP address.
    pub ip: IpAddr,
}

impl ScanTarget {
    /// Create a new scan target.
    pub fn new(original: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            original: original.into(),
            ip,
        }
    }

    /// Host name to present in HTTP requests.
    pub fn virtual_host(&self) -> &str {
        &self.original
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.original == self.ip.to_string() {
            write!(f, "{}", self.ip)
        } else {
            write!(f, "{} ({})", self.original, self.ip)
        }
    }
}

/// Error type for target parsing and resolution.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target format: {0}")]
    InvalidFormat(String),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
}

/// A target specification.
///
/// Supports:
/// - IPv4: "192.168.1.1"
/// - IPv6: "::1"
/// - Hostname: "example.com"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single IP address.
    Single(IpAddr),
    /// A hostname to be resolved.
    Hostname(String),
}

impl TargetSpec {
    /// Parse a target specification from a string.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Single(ip));
        }

        // Bracketed IPv6 as commonly pasted from URLs
        if let Some(inner) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            if let Ok(ip) = inner.parse::<IpAddr>() {
                return Ok(Self::Single(ip));
            }
        }

        let host = s.trim_end_matches('.');
        if is_valid_hostname(host) {
            return Ok(Self::Hostname(host.to_ascii_lowercase()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }

    /// Resolve this target to the address that will be scanned.
    ///
    /// Hostnames are resolved with the system resolver configuration and the
    /// first A or AAAA record wins.
    pub async fn resolve(&self) -> Result<ScanTarget, TargetError> {
        match self {
            Self::Single(ip) => Ok(ScanTarget::new(ip.to_string(), *ip)),

            Self::Hostname(hostname) => {
                let response = system_resolver().lookup_ip(hostname.as_str()).await.map_err(|e| {
                    TargetError::DnsResolutionFailed(hostname.clone(), e.to_string())
                })?;

                let ips: Vec<IpAddr> = response.iter().collect();
                debug!(%hostname, addresses = ?ips, "resolved target");

                let ip = ips
                    .first()
                    .copied()
                    .ok_or_else(|| TargetError::NoAddressesFound(hostname.clone()))?;
                Ok(ScanTarget::new(hostname.clone(), ip))
            }
        }
    }
}

/// Resolver built from the system configuration, or public defaults when it
/// cannot be read.
fn system_resolver() -> TokioAsyncResolver {
    TokioAsyncResolver::tokio_from_system_conf()
        .unwrap_or_else(|_| TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()))
}

/// Look up the PTR name for `ip`.
///
/// Best effort: lookup failures and empty answers yield `None`.
pub async fn reverse_lookup(ip: IpAddr) -> Option<String> {
    match system_resolver().reverse_lookup(ip).await {
        Ok(response) => response.iter().next().and_then(|ptr| ptr_name(&ptr.to_string())),
        Err(e) => {
            debug!(%ip, error = %e, "reverse lookup failed");
            None
        }
    }
}

/// Normalize a PTR answer: drop the root dot, reject empty names.
fn ptr_name(raw: &str) -> Option<String> {
    let name = raw.trim().trim_end_matches('.');
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}

impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    // Each label must be 1-63 characters
    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        // Must start and end with alphanumeric
        if !label.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        if !label.chars().last().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        // Can only contain alphanumeric and hyphens
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}
