//! CSV output formatting.

use super::visible;
use crate::scanner::HostReport;
use std::io::{self, Write};

/// Write one CSV row per shown port.
pub fn write_csv<W: Write>(out: &mut W, report: &HostReport, show_all: bool) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record([
        "ip",
        "port",
        "state",
        "potential_services",
        "confirmed_service",
        "banner",
        "error",
        "response_time_ms",
    ])?;

    for result in visible(report, show_all) {
        let potential: Vec<&str> = result.potential_services.iter().map(|s| s.as_str()).collect();
        let row: [String; 8] = [
            result.address.ip().to_string(),
            result.port().to_string(),
            result.outcome.label().to_string(),
            potential.join(" "),
            result.confirmed_service.map_or_else(String::new, |s| s.to_string()),
            result.banner_text(),
            result.error().unwrap_or_default().to_string(),
            result.response_time_ms.map_or_else(String::new, |t| t.to_string()),
        ];
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
