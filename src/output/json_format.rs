//! JSON output formatting.

use super::visible;
use crate::scanner::HostReport;
use std::io::{self, Write};

/// Write the report as pretty-printed JSON.
pub fn write_json<W: Write>(out: &mut W, report: &HostReport, show_all: bool) -> io::Result<()> {
    let report = HostReport {
        results: visible(report, show_all).cloned().collect(),
        ..report.clone()
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)
}
