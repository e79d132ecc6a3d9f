//! Display logic for the whois-batch CLI.
//!
//! This module handles all human-readable output: the header, the updating
//! progress line, grouped results, summaries and the error summary. Progress
//! goes to stderr so stdout stays clean.

use console::{pad_str, style, Alignment, Term};
use whois_batch_lib::{BatchConfig, BatchProgress, BatchReport, LookupOutcome, LookupResult};

use crate::ErrorStats;

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a run.
pub fn print_header(domain_count: usize, config: &BatchConfig) {
    println!(
        "{} {} {}",
        style("whois-batch").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "| Checking {} domain{}",
            domain_count,
            if domain_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );

    println!(
        "{}",
        style(format!(
            "Concurrency: {} | Delay: {}ms | Timeout: {}s",
            config.pool_size,
            config.per_request_delay.as_millis(),
            config.request_timeout.as_secs_f64(),
        ))
        .dim()
    );
    println!();
}

// ── Progress ─────────────────────────────────────────────────────────────────

/// Text of the progress line, e.g. `Progress: 42.0% (21/50)`.
pub fn format_progress(progress: BatchProgress) -> String {
    format!(
        "Progress: {:.1}% ({}/{})",
        progress.percent(),
        progress.completed,
        progress.total
    )
}

/// Rewrite the progress line in place; the final update ends the line.
pub fn print_progress(term: &Term, progress: BatchProgress) {
    if term.is_term() {
        let _ = term.clear_line();
        let _ = term.write_str(&format_progress(progress));
    } else {
        let _ = term.write_str(&format!("\r{}", format_progress(progress)));
    }

    if progress.is_complete() {
        let _ = term.write_line("");
    }
}

// ── Grouped results ──────────────────────────────────────────────────────────

/// Print results grouped by outcome: Available, Registered, Failed.
/// Empty sections are omitted entirely.
pub fn print_grouped_results(report: &BatchReport, show_dns: bool, debug: bool) {
    let mut available: Vec<&LookupResult> = Vec::new();
    let mut registered: Vec<&LookupResult> = Vec::new();
    let mut failed: Vec<&LookupResult> = Vec::new();

    for r in &report.results {
        match r.outcome {
            LookupOutcome::Available => available.push(r),
            LookupOutcome::Registered => registered.push(r),
            LookupOutcome::Error => failed.push(r),
        }
    }

    println!();

    if !available.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Available ({}) ", available.len()))
                .green()
                .bold(),
            style("─".repeat(40)).green().dim(),
        );
        for r in &available {
            print_grouped_line(r, show_dns, debug);
        }
        println!();
    }

    if !registered.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Registered ({}) ", registered.len()))
                .red()
                .bold(),
            style("─".repeat(39)).red().dim(),
        );
        for r in &registered {
            print_grouped_line(r, show_dns, debug);
        }
        println!();
    }

    if !failed.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Failed ({}) ", failed.len()))
                .yellow()
                .bold(),
            style("─".repeat(43)).yellow().dim(),
        );
        for r in &failed {
            print_grouped_line(r, show_dns, debug);
        }
        println!();
    }
}

/// Print a single line inside a grouped section.
fn print_grouped_line(result: &LookupResult, show_dns: bool, debug: bool) {
    let domain_width = 30;
    let padded = pad_str(&result.domain, domain_width, Alignment::Left, Some(".."));

    match result.outcome {
        LookupOutcome::Available => {
            println!("    {}", style(&padded).white());
        }
        LookupOutcome::Registered => {
            let dns = match (&result.dns_serve, show_dns) {
                (Some(dns), true) => format!("  {}", style(format!("DNS: {}", dns)).dim()),
                _ => String::new(),
            };
            println!("    {}{}", style(&padded).white(), dns);
        }
        LookupOutcome::Error => {
            println!(
                "    {}  {}",
                style(&padded).white(),
                style(brief_error(result)).dim()
            );
        }
    }

    if debug {
        if let Some(message) = &result.error_message {
            println!("      {} {}", style("└─").dim(), style(message).dim());
        }
        if let Some(duration) = result.check_duration {
            println!(
                "      {} Checked in {}ms",
                style("└─").dim(),
                duration.as_millis(),
            );
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(report: &BatchReport) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} domain{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(report.total).bold(),
        if report.total == 1 { "" } else { "s" },
        report.elapsed.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", report.available.len())).green(),
        style("|").dim(),
        style(format!("{} registered", report.registered.len())).red(),
        style("|").dim(),
        style(format!("{} failed", report.errors.len())).yellow(),
    );
}

// ── Error summary ────────────────────────────────────────────────────────────

/// Print failed domains grouped by error kind.
pub fn print_error_summary(error_stats: &ErrorStats, debug: bool) {
    if !error_stats.has_errors() {
        return;
    }

    println!();
    println!(
        "  {}",
        style("Some domains could not be checked:").yellow()
    );

    for (kind, domains) in error_stats.groups() {
        let list = if debug {
            domains.join(", ")
        } else {
            format_domain_list(domains, 5)
        };
        println!(
            "  {} {} {}{}: {}",
            style("•").dim(),
            domains.len(),
            kind,
            if domains.len() == 1 { "" } else { "s" },
            list,
        );
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Join domains, showing at most `max_show` and counting the rest.
fn format_domain_list(domains: &[String], max_show: usize) -> String {
    if domains.len() <= max_show {
        domains.join(", ")
    } else {
        let shown = &domains[..max_show];
        let remaining = domains.len() - max_show;
        format!("{}, ... and {} more", shown.join(", "), remaining)
    }
}

/// Extract a brief error reason from a failed result.
fn brief_error(result: &LookupResult) -> String {
    match result.error_kind {
        Some(kind) => format!("({})", kind),
        None => "(error)".to_string(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
