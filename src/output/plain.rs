//! Plain text output formatting.
//!
//! Produces human-readable output with colors. One line per port in the
//! `<ip>:<port> (state) [banner] service` shape.

use super::visible;
use crate::scanner::{HostReport, PortOutcome, ScanResult};
use crate::services::Service;
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// Longest banner shown inline.
const MAX_BANNER_DISPLAY: usize = 60;

/// Write a report in human-readable plain text.
pub fn write_plain<W: Write>(out: &mut W, report: &HostReport, show_all: bool) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;

    let target = match &report.hostname {
        Some(hostname) => format!("{} ({})", hostname, report.ip),
        None => report.ip.to_string(),
    };
    writeln!(out, "  {} {}", style("Target:").bold(), target)?;
    if let Some(name) = &report.reverse_name {
        writeln!(out, "  {} {}", style("Reverse DNS:").bold(), name)?;
    }
    writeln!(
        out,
        "  {} {} ports scanned in {:.2}s",
        style("Statistics:").bold(),
        report.ports_scanned,
        report.duration_ms as f64 / 1000.0
    )?;
    writeln!(
        out,
        "              {} open, {} closed, {} unknown",
        style(report.open_count()).green().bold(),
        style(report.closed_count()).red(),
        style(report.unknown_count()).yellow()
    )?;
    writeln!(out, "{}", style(RULE).cyan())?;

    let mut shown = 0;
    for result in visible(report, show_all) {
        writeln!(out, "  {}", format_line(result))?;
        shown += 1;
    }
    if shown == 0 {
        writeln!(out, "  {}", style("No open ports found.").dim())?;
    }

    writeln!(out)?;
    Ok(())
}

/// Render one result line.
fn format_line(result: &ScanResult) -> String {
    let state_style = match result.outcome {
        PortOutcome::Open => Style::new().green().bold(),
        PortOutcome::Closed => Style::new().red(),
        PortOutcome::Unknown { .. } => Style::new().yellow(),
    };

    let mut line = format!(
        "{} ({})",
        result.address,
        state_style.apply_to(result.outcome.label())
    );

    if !result.banner.is_empty() {
        let banner = truncate_string(&result.banner_text(), MAX_BANNER_DISPLAY);
        line.push_str(&format!(" [{}]", style(banner).dim()));
    }

    match result.confirmed_service {
        Some(service) => line.push_str(&format!(" {}", style(service).bold())),
        None if !result.potential_services.is_empty() => {
            line.push_str(&format!(" {}?", join_services(&result.potential_services)));
        }
        None => {}
    }

    if let Some(error) = result.error() {
        line.push_str(&format!(" {}", style(error).dim()));
    }

    line
}

fn join_services(services: &[Service]) -> String {
    services
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

/// Write the service catalog, one port per line.
pub fn write_catalog<W: Write>(
    out: &mut W,
    entries: impl Iterator<Item = (u16, &'static [Service])>,
) -> io::Result<()> {
    for (port, services) in entries {
        writeln!(out, "{:>6}  {}", port, join_services(services))?;
    }
    Ok(())
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(target: &str, ports: usize, detectors: &[String]) {
    eprintln!();
    eprintln!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("hunt").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{} Target: {}", style("•").dim(), style(target).white().bold());
    eprintln!(
        "{} Scanning {} ports...",
        style("•").dim(),
        style(ports).white().bold()
    );
    if !detectors.is_empty() {
        eprintln!(
            "{} Detectors: {}",
            style("•").dim(),
            style(detectors.join(", ")).yellow()
        );
    }
    eprintln!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate a string to a maximum length, adding ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
