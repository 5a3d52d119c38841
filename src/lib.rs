//! # hunt - Network Reconnaissance Engine
//!
//! hunt probes TCP ports on a single host, captures whatever the service
//! sends first, and runs active detectors to confirm which application
//! protocol is listening.
//!
//! ## Features
//!
//! - **Connect Scanning**: Open, closed, or unknown for every requested port
//! - **Banner Grabbing**: Passive capture of unsolicited greetings
//! - **Service Detection**: Pluggable detectors, HTTP and SSH built in
//! - **Service Catalog**: Well-known port to service hints
//! - **Bounded Concurrency**: Configurable parallelism, cancellation, deadlines
//! - **Multiple Output Formats**: Plain text, JSON, and CSV
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use hunt::scanner::{scan_ports, NoopObserver, ScanOptions, TcpProber};
//! use hunt::types::PortSpec;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let ip = "192.168.1.1".parse().unwrap();
//!     let ports = "22,80,443".parse::<PortSpec>().unwrap().to_ports();
//!     let prober = TcpProber::new(Duration::from_secs(1));
//!
//!     let report = scan_ports(
//!         ip,
//!         &ports,
//!         &prober,
//!         &ScanOptions::default(),
//!         &NoopObserver,
//!         &CancellationToken::new(),
//!     )
//!     .await;
//!
//!     for result in report.interesting() {
//!         println!("{}", result);
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Ports, addresses, and targets as validated newtypes
//! - [`services`] - The port to service catalog
//! - [`banner`] - Passive banner reads
//! - [`detect`] - The `Detector` trait and built-in detectors
//! - [`scanner`] - Single-port prober and the concurrent orchestrator
//! - [`config`] - Settings file handling
//! - [`output`] - Report rendering
//! - [`error`] - Setup error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod output;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ConfigError};
pub use scanner::{scan_ports, HostReport, PortOutcome, ScanOptions, ScanResult, TcpProber};
pub use services::Service;
pub use types::{Port, PortSpec, ScanTarget, TargetSpec, TransportAddress};
