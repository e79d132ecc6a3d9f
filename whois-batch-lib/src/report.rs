//! Plain-text batch reports.
//!
//! A report has a title and three labeled sections, one domain per line:
//!
//! ```text
//! === Domain Check Results ===
//!
//! --- Available Domains ---
//! free.com
//!
//! --- Registered Domains ---
//! taken.com
//!
//! --- Failed Domains ---
//! broken.com
//! ```

use crate::error::LookupError;
use crate::types::BatchReport;
use chrono::{DateTime, Local, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const TITLE: &str = "=== Domain Check Results ===";

impl BatchReport {
    /// Render the report in its plain-text file layout.
    pub fn render_text(&self) -> String {
        let mut out = format!("{}\n\n", TITLE);

        let sections = [
            ("Available Domains", &self.available),
            ("Registered Domains", &self.registered),
            ("Failed Domains", &self.errors),
        ];

        for (i, (label, domains)) in sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("--- {} ---\n", label));
            for domain in domains.iter() {
                out.push_str(domain);
                out.push('\n');
            }
        }

        out
    }
}

/// File name for a report written at `now`.
pub fn default_report_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("domain_check_results_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

/// Save `report` into `dir` under a timestamped name.
///
/// The directory is created if it does not exist yet.
pub fn save_report<P: AsRef<Path>>(report: &BatchReport, dir: P) -> Result<PathBuf, LookupError> {
    let dir = dir.as_ref();

    fs::create_dir_all(dir).map_err(|e| {
        LookupError::file_error(
            dir.to_string_lossy(),
            format!("Failed to create report directory: {}", e),
        )
    })?;

    let path = dir.join(default_report_name(&Local::now()));
    fs::write(&path, report.render_text()).map_err(|e| {
        LookupError::file_error(
            path.to_string_lossy(),
            format!("Failed to write report: {}", e),
        )
    })?;

    info!(path = %path.display(), "saved batch report");
    Ok(path)
}
