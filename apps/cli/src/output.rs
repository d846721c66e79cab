//! Output formatting for the final run report

use crate::OutputFormat;
use bulkget_core::RunReport;
use console::style;
use std::time::Duration;

/// Print the run report in the selected format
pub fn print_report(report: &RunReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Human => {
            println!();
            println!(
                "Transferred {} in {} ({}/s)",
                style(format_bytes(report.bytes_transferred)).bold(),
                format_duration(report.elapsed),
                format_bytes(report.throughput_bps())
            );
            if report.failed > 0 {
                println!(
                    "{} completed, {} failed",
                    report.completed,
                    style(report.failed).red().bold()
                );
            } else {
                println!("{} completed", report.completed);
            }
        }
    }
    Ok(())
}

/// Format bytes as human-readable
pub fn format_bytes(bytes: u64) -> String {
    human_bytes::human_bytes(bytes as f64)
}

/// Format a duration as hours, minutes and seconds with millisecond
/// precision, like `1h 2m 3.450s`
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis() as u64;
    let millis = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h ", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m ", minutes));
    }
    if millis > 0 {
        out.push_str(&format!("{}.{:03}s", secs, millis));
    } else {
        out.push_str(&format!("{}s", secs));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_short_durations() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(4123)), "4.123s");
        assert_eq!(format_duration(Duration::from_millis(50)), "0.050s");
    }

    #[test]
    fn formats_long_durations() {
        assert_eq!(format_duration(Duration::from_secs(61)), "1m 1s");
        assert_eq!(format_duration(Duration::from_millis(61_500)), "1m 1.500s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }
}
