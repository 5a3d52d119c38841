//! Output formatting module.
//!
//! Renders host reports as plain text, JSON, or CSV. The scanner itself never
//! formats anything; it hands finished reports to these writers.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::write_csv;
pub use json_format::write_json;
pub use plain::{print_error, print_info, print_scan_header, print_warning, write_catalog, write_plain};

use crate::cli::OutputFormat;
use crate::scanner::{HostReport, ScanResult};
use std::io::{self, Write};

/// Which results a report shows.
fn visible(report: &HostReport, show_all: bool) -> impl Iterator<Item = &ScanResult> {
    report
        .results
        .iter()
        .filter(move |r| show_all || r.is_interesting())
}

/// Write a report to `out` in the requested format.
pub fn write_report<W: Write>(
    out: &mut W,
    report: &HostReport,
    format: OutputFormat,
    show_all: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Plain => write_plain(out, report, show_all),
        OutputFormat::Json => write_json(out, report, show_all),
        OutputFormat::Csv => write_csv(out, report, show_all),
    }
}

/// Print a report to stdout.
pub fn print_report(report: &HostReport, format: OutputFormat, show_all: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, report, format, show_all)?;
    out.flush()
}
