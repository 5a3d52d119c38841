//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `hunt scan <target>` - Probe a host's ports and fingerprint services
//! - `hunt services` - List the port to service catalog
//! - `hunt config show|path|init` - Inspect or write the settings file

mod config;
mod scan;

pub use config::ConfigCommand;
pub use scan::ScanCommand;

use crate::config::ScanSettings;
use crate::error::CliResult;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Load settings from `file`, or from the default location when unset.
pub fn load_settings(file: Option<&Path>) -> CliResult<ScanSettings> {
    let settings = match file {
        Some(path) => ScanSettings::load_from(path)?,
        None => ScanSettings::load()?,
    };
    Ok(settings)
}

/// hunt - network reconnaissance from a single host.
///
/// Connects to each requested TCP port, grabs whatever the service says
/// first, and runs active detectors to confirm what is listening.
#[derive(Parser, Debug)]
#[command(name = "hunt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "TCP port scanner and service fingerprinter", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to custom settings file
    #[arg(long, global = true, value_name = "PATH", env = "HUNT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a target for open ports
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// List known ports and the services they usually carry
    Services,

    /// Show or initialize the settings file
    Config(ConfigCommand),
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::DetectorKind;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_command() {
        let cli = Cli::try_parse_from([
            "hunt", "-vv", "scan", "example.com", "-p", "22,80", "--detect", "ssh,http", "-o",
            "json", "-R",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Scan(scan) => {
                assert_eq!(scan.target, "example.com");
                assert_eq!(scan.ports, "22,80");
                assert_eq!(scan.detect, Some(vec![DetectorKind::Ssh, DetectorKind::Http]));
                assert_eq!(scan.output, OutputFormat::Json);
                assert!(scan.reverse_dns);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_scan_defaults() {
        let cli = Cli::try_parse_from(["hunt", "scan", "10.0.0.1"]).unwrap();
        match cli.command {
            Commands::Scan(scan) => {
                assert_eq!(scan.ports, "common");
                assert_eq!(scan.output, OutputFormat::Plain);
                assert!(!scan.reverse_dns);
                assert!(scan.detect.is_none());
                assert!(scan.concurrency.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, r#"{"concurrency": 12}"#).unwrap();
        assert_eq!(load_settings(Some(&path)).unwrap().concurrency, 12);

        std::fs::write(&path, "{ bad json").unwrap();
        assert!(matches!(
            load_settings(Some(&path)),
            Err(crate::error::CliError::Config(_))
        ));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }
}
