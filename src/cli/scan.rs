//! Scan subcommand implementation.
//!
//! Handles the `hunt scan <target>` command for port scanning.

use crate::cli::OutputFormat;
use crate::config::ScanSettings;
use crate::detect::{build_detectors, DetectorKind};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::scanner::{scan_ports, HostReport, ProgressObserver, TracingObserver};
use crate::types::{reverse_lookup, PortSpec, TargetSpec};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Scan a target for open ports.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Target to scan (IP address or hostname)
    ///
    /// Examples:
    ///   192.168.1.1        IPv4 address
    ///   ::1                IPv6 address
    ///   example.com        Hostname, also used as the HTTP virtual host
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Ports to scan (e.g., "80", "80,443", "1-1000", "common", "all")
    #[arg(short, long, default_value = "common")]
    pub ports: String,

    /// Maximum number of concurrent probes
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Connection timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// How long to wait for an unsolicited banner, in milliseconds
    #[arg(long, value_name = "MS")]
    pub banner_timeout: Option<u64>,

    /// Detectors to run on open ports, in order
    #[arg(short = 'd', long, value_enum, value_delimiter = ',')]
    pub detect: Option<Vec<DetectorKind>>,

    /// Disable all active detectors
    #[arg(long, conflicts_with = "detect")]
    pub no_detect: bool,

    /// Virtual host for HTTP detection (defaults to the target)
    #[arg(long, value_name = "HOST")]
    pub vhost: Option<String>,

    /// Fixed User-Agent for HTTP detection
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Give up on the whole scan after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub deadline: Option<u64>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Show closed and failed ports in output
    #[arg(long)]
    pub show_closed: bool,

    /// Look up the PTR name of the scanned address
    #[arg(short = 'R', long)]
    pub reverse_dns: bool,
}

impl ScanCommand {
    /// Layer command-line flags over loaded settings.
    pub fn apply_overrides(&self, settings: &ScanSettings) -> CliResult<ScanSettings> {
        let mut merged = settings.clone();

        if let Some(concurrency) = self.concurrency {
            merged.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            merged.connect_timeout_ms = timeout;
        }
        if let Some(timeout) = self.banner_timeout {
            merged.banner_timeout_ms = timeout;
        }
        if let Some(detect) = &self.detect {
            merged.detectors = detect.clone();
        }
        if self.no_detect {
            merged.detectors.clear();
            merged.banner_patterns.clear();
        }
        if let Some(user_agent) = &self.user_agent {
            merged.user_agent = Some(user_agent.clone());
        }
        if let Some(deadline) = self.deadline {
            merged.scan_deadline_ms = Some(deadline);
        }

        merged.validate()?;
        Ok(merged)
    }

    /// Execute the scan command.
    pub async fn execute(&self, settings: &ScanSettings, quiet: bool) -> CliResult<()> {
        let settings = self.apply_overrides(settings)?;

        let port_spec: PortSpec = self.ports.parse()?;
        let ports = port_spec.to_ports();
        if ports.is_empty() {
            return Err(CliError::Other("No valid ports specified".to_string()));
        }

        let target = TargetSpec::parse(&self.target)?.resolve().await?;
        debug!(target = %target, "resolved target");

        let virtual_host = self.vhost.as_deref().unwrap_or_else(|| target.virtual_host());
        let detectors = build_detectors(&settings.detectors, &settings, virtual_host)?;
        let prober = settings.prober().with_detectors(detectors);

        let cancel = CancellationToken::new();
        let cancel_ctrlc = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, cancelling scan");
                cancel_ctrlc.cancel();
            }
        });

        let interactive = !quiet && self.output == OutputFormat::Plain;
        if interactive {
            let names: Vec<String> = settings
                .detectors
                .iter()
                .map(|d| d.to_string())
                .chain(settings.banner_patterns.iter().map(|rule| rule.service.to_string()))
                .collect();
            output::print_scan_header(&target.to_string(), ports.len(), &names);
        }

        let options = settings.scan_options();
        let report = if interactive {
            let observer = (TracingObserver, ProgressObserver::new(ports.len()));
            let report = scan_ports(target.ip, &ports, &prober, &options, &observer, &cancel).await;
            observer.1.finish();
            report
        } else {
            scan_ports(target.ip, &ports, &prober, &options, &TracingObserver, &cancel).await
        };
        cancel.cancel();

        let mut report = label(report, &target.original);
        if self.reverse_dns {
            if let Some(name) = reverse_lookup(target.ip).await {
                report = report.with_reverse_name(name);
            }
        }
        output::print_report(&report, self.output, self.show_closed)?;

        if interactive && report.open_count() == 0 && report.unknown_count() > 0 {
            output::print_warning(&format!(
                "{} ports gave no clear answer; try a longer --timeout",
                report.unknown_count()
            ));
        }

        Ok(())
    }
}

/// Attach the hostname when the target was given as one.
fn label(report: HostReport, original: &str) -> HostReport {
    if original.parse::<std::net::IpAddr>().is_ok() {
        report
    } else {
        report.with_hostname(original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};

    fn scan_command(args: &[&str]) -> ScanCommand {
        let mut argv = vec!["hunt", "scan"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Scan(scan) => scan,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_overrides_replace_settings() {
        let cmd = scan_command(&[
            "10.0.0.1", "-c", "10", "-t", "250", "--detect", "ssh", "--user-agent", "probe/1.0",
            "--deadline", "5000",
        ]);
        let merged = cmd.apply_overrides(&ScanSettings::default()).unwrap();

        assert_eq!(merged.concurrency, 10);
        assert_eq!(merged.connect_timeout_ms, 250);
        assert_eq!(merged.detectors, vec![DetectorKind::Ssh]);
        assert_eq!(merged.user_agent.as_deref(), Some("probe/1.0"));
        assert_eq!(merged.scan_deadline_ms, Some(5000));
        assert_eq!(merged.banner_timeout_ms, ScanSettings::default().banner_timeout_ms);
    }

    #[test]
    fn test_no_detect_clears_detectors() {
        let cmd = scan_command(&["10.0.0.1", "--no-detect"]);
        let settings = ScanSettings {
            banner_patterns: vec![crate::config::BannerPattern {
                service: crate::services::Service::Ftp,
                pattern: "^220".to_string(),
            }],
            ..ScanSettings::default()
        };
        let merged = cmd.apply_overrides(&settings).unwrap();
        assert!(merged.detectors.is_empty());
        assert!(merged.banner_patterns.is_empty());
    }

    #[test]
    fn test_overrides_are_validated() {
        let cmd = scan_command(&["10.0.0.1", "-c", "0"]);
        assert!(matches!(
            cmd.apply_overrides(&ScanSettings::default()),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_label_only_for_hostnames() {
        let report = HostReport {
            hostname: None,
            reverse_name: None,
            ip: "127.0.0.1".parse().unwrap(),
            started_at: chrono::Utc::now(),
            duration_ms: 0,
            ports_scanned: 0,
            results: Vec::new(),
        };
        assert!(label(report.clone(), "127.0.0.1").hostname.is_none());
        assert_eq!(label(report, "localhost").hostname.as_deref(), Some("localhost"));
    }

    #[tokio::test]
    async fn test_execute_rejects_bad_ports() {
        let cmd = scan_command(&["127.0.0.1", "-p", "0", "-o", "json"]);
        let err = cmd.execute(&ScanSettings::default(), true).await.unwrap_err();
        assert!(matches!(err, CliError::Port(_)));
    }

    #[tokio::test]
    async fn test_execute_scans_localhost() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port().to_string();

        let cmd = scan_command(&["127.0.0.1", "-p", &port, "--no-detect", "-o", "json", "--banner-timeout", "50"]);
        tokio_test::assert_ok!(cmd.execute(&ScanSettings::default(), true).await);
    }
}
