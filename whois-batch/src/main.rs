//! WHOIS Batch CLI Application
//!
//! A command-line interface for checking whether batches of domain names are
//! registered, on top of whois-batch-lib. Prefixes come from arguments, a file,
//! the built-in lucky-number dictionary or stdin, and are joined with one suffix.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use console::Term;
use std::collections::HashMap;
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use whois_batch_lib::{
    build_domains, dedup_domains, generate_lucky_numbers, load_env_config, parse_duration_string,
    parse_prefix_lines, save_report, write_lucky_numbers, BatchChecker, BatchConfig, BatchReport,
    ConfigManager, EnvConfig, ErrorKind, FileConfig, DEFAULT_LUCKY_LIMIT,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for whois-batch
#[derive(Parser, Debug)]
#[command(name = "whois-batch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch-check domain registration through a WHOIS lookup API")]
#[command(
    long_about = "Batch-check domain registration through a WHOIS lookup API.\n\nEach prefix is joined with the suffix (e.g. 888888 + com = 888888.com), checked over a bounded worker pool with a fixed delay between requests, and sorted into available, registered and failed domains."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain prefixes to check (read from stdin when no other source is given)
    #[arg(value_name = "PREFIXES", help_heading = "Domain Selection")]
    pub prefixes: Vec<String>,

    /// Domain suffix appended to every prefix (e.g. com, .cn, com.cn)
    #[arg(
        short = 's',
        long = "suffix",
        value_name = "SUFFIX",
        help_heading = "Domain Selection"
    )]
    pub suffix: Option<String>,

    /// Input file with prefixes (one per line, # comments allowed)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Domain Selection"
    )]
    pub file: Option<String>,

    /// Use the built-in lucky-number dictionary as prefixes
    #[arg(long = "lucky", help_heading = "Lucky Numbers")]
    pub lucky: bool,

    /// How many lucky numbers to generate
    #[arg(
        long = "lucky-limit",
        value_name = "N",
        default_value_t = DEFAULT_LUCKY_LIMIT,
        help_heading = "Lucky Numbers"
    )]
    pub lucky_limit: usize,

    /// Write the lucky-number dictionary to FILE
    #[arg(long = "save-lucky", value_name = "FILE", help_heading = "Lucky Numbers")]
    pub save_lucky: Option<String>,

    /// Print the domains that would be checked and exit
    #[arg(long = "dry-run", help_heading = "Domain Selection")]
    pub dry_run: bool,

    /// Max concurrent lookups (default: 5, max: 100)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Delay after each request, e.g. 500ms, 1s (default: 1s)
    #[arg(long = "delay", value_name = "DURATION", help_heading = "Performance")]
    pub delay: Option<String>,

    /// Per-request timeout, e.g. 10s (default: 10s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// WHOIS lookup API endpoint
    #[arg(long = "endpoint", value_name = "URL", help_heading = "API")]
    pub endpoint: Option<String>,

    /// User-Agent header sent with every request
    #[arg(long = "user-agent", value_name = "UA", help_heading = "API")]
    pub user_agent: Option<String>,

    /// Directory for the results file (default: current directory)
    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "DIR",
        help_heading = "Output"
    )]
    pub output_dir: Option<String>,

    /// Do not write the results file
    #[arg(long = "no-save", help_heading = "Output")]
    pub no_save: bool,

    /// Print the full report as JSON
    #[arg(short = 'j', long = "json", help_heading = "Output")]
    pub json: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show detailed debug information and error messages
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Settings after merging config files, environment and CLI arguments.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) batch: BatchConfig,
    pub(crate) suffix: Option<String>,
    pub(crate) file: Option<String>,
    pub(crate) output_dir: PathBuf,
    pub(crate) save: bool,
    pub(crate) json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            suffix: None,
            file: None,
            output_dir: PathBuf::from("."),
            save: true,
            json: false,
        }
    }
}

/// Order in which error kinds are listed in the summary.
pub(crate) const ERROR_KIND_ORDER: [ErrorKind; 6] = [
    ErrorKind::InvalidFormat,
    ErrorKind::Http,
    ErrorKind::Timeout,
    ErrorKind::Network,
    ErrorKind::Parse,
    ErrorKind::Internal,
];

/// Error statistics for aggregated reporting
#[derive(Debug, Default)]
pub(crate) struct ErrorStats {
    by_kind: HashMap<ErrorKind, Vec<String>>,
}

impl ErrorStats {
    /// Group the failed domains of a report by error kind.
    fn from_report(report: &BatchReport) -> Self {
        let mut stats = Self::default();
        for result in &report.results {
            if let Some(kind) = result.error_kind {
                stats.add_error(&result.domain, kind);
            }
        }
        stats
    }

    fn add_error(&mut self, domain: &str, kind: ErrorKind) {
        self.by_kind
            .entry(kind)
            .or_default()
            .push(domain.to_string());
    }

    pub(crate) fn has_errors(&self) -> bool {
        self.by_kind.values().any(|domains| !domains.is_empty())
    }

    /// Non-empty groups in display order.
    pub(crate) fn groups(&self) -> impl Iterator<Item = (ErrorKind, &[String])> + '_ {
        ERROR_KIND_ORDER.iter().filter_map(|kind| {
            self.by_kind
                .get(kind)
                .filter(|domains| !domains.is_empty())
                .map(|domains| (*kind, domains.as_slice()))
        })
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_tracing(&args);
    info!("whois-batch v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_batch_check(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`/`-d`.
fn init_tracing(args: &Args) {
    let default_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    for (flag, value) in [("--delay", &args.delay), ("--timeout", &args.timeout)] {
        if let Some(value) = value {
            if parse_duration_string(value).is_none() {
                return Err(format!(
                    "Invalid {} value '{}'. Use format like '500ms', '1s', '2m'",
                    flag, value
                ));
            }
        }
    }

    if let Some(endpoint) = &args.endpoint {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(format!("Endpoint '{}' must be an http(s) URL", endpoint));
        }
    }

    if (args.lucky || args.save_lucky.is_some()) && args.lucky_limit == 0 {
        return Err("--lucky-limit must be at least 1".to_string());
    }

    if let Some(suffix) = &args.suffix {
        if suffix.trim().trim_start_matches('.').is_empty() {
            return Err("Domain suffix cannot be empty".to_string());
        }
    }

    Ok(())
}

async fn run_batch_check(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;
    debug!(?settings, "resolved settings");

    let has_prefix_source = !args.prefixes.is_empty() || settings.file.is_some() || args.lucky;

    if let Some(path) = &args.save_lucky {
        let count = write_lucky_numbers(path, args.lucky_limit)?;
        println!("Saved {} lucky numbers to {}", count, path);
        if !has_prefix_source {
            return Ok(());
        }
    }

    let suffix = settings
        .suffix
        .clone()
        .ok_or("A domain suffix is required. Use --suffix, WB_SUFFIX or [defaults] suffix")?;

    let prefixes = if has_prefix_source {
        collect_prefixes(&args, &settings)?
    } else {
        read_prefixes_from_stdin()?
    };

    let domains = dedup_domains(&build_domains(&prefixes, &suffix));
    if domains.is_empty() {
        return Err("No domain prefixes given".into());
    }

    // Dry-run: print domains and exit without checking
    if args.dry_run {
        if settings.json {
            println!("{}", serde_json::to_string_pretty(&domains)?);
        } else {
            for d in &domains {
                println!("{}", d);
            }
        }
        eprintln!("{} domains would be checked", domains.len());
        return Ok(());
    }

    let checker = BatchChecker::with_config(settings.batch.clone())?;

    if !settings.json {
        ui::print_header(domains.len(), checker.config());
    }

    let term = Term::stderr();
    let report = checker
        .check_batch_with_progress(&domains, move |progress| {
            ui::print_progress(&term, progress)
        })
        .await;

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        ui::print_grouped_results(&report, args.verbose || args.debug, args.debug);
        ui::print_summary(&report);
        ui::print_error_summary(&ErrorStats::from_report(&report), args.debug);
    }

    if settings.save {
        let path = save_report(&report, &settings.output_dir)?;
        if settings.json {
            eprintln!("Results saved to {}", path.display());
        } else {
            println!();
            println!("Results saved to {}", path.display());
        }
    }

    Ok(())
}

/// Build settings from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (WB_*)
/// 3. Local config file (./whois-batch.toml or ./.whois-batch.toml)
/// 4. Global config file (~/.whois-batch.toml)
/// 5. XDG config file (~/.config/whois-batch/config.toml)
/// 6. Built-in defaults
fn build_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let env_config = load_env_config(args.verbose);
    let config_manager = ConfigManager::new(args.verbose);

    let explicit_path = args.config.as_ref().or(env_config.config.as_ref());

    let file_config = match explicit_path {
        Some(path) => {
            info!("Using explicit config file: {}", path);
            config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
        }
        None => config_manager.discover_and_load()?,
    };

    resolve_settings(file_config, &env_config, args)
}

/// Merge the three configuration layers into final settings.
fn resolve_settings(
    file_config: FileConfig,
    env_config: &EnvConfig,
    args: &Args,
) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings {
        batch: file_config.apply_to(BatchConfig::default()),
        ..Default::default()
    };

    // Step 1: config file values beyond BatchConfig
    if let Some(defaults) = &file_config.defaults {
        settings.suffix = defaults.suffix.clone();
    }
    if let Some(output) = &file_config.output {
        if let Some(directory) = &output.directory {
            settings.output_dir = PathBuf::from(directory);
        }
        settings.save = output.save.unwrap_or(settings.save);
        settings.json = output.json.unwrap_or(settings.json);
    }

    // Step 2: environment variables (WB_*)
    settings.batch = env_config.apply_to(settings.batch);
    if let Some(suffix) = &env_config.suffix {
        settings.suffix = Some(suffix.clone());
    }
    if let Some(directory) = &env_config.output_dir {
        settings.output_dir = PathBuf::from(directory);
    }
    settings.save = env_config.save.unwrap_or(settings.save);
    settings.json = env_config.json.unwrap_or(settings.json);
    settings.file = env_config.file.clone();

    // Step 3: CLI arguments (highest precedence)
    if let Some(concurrency) = args.concurrency {
        settings.batch = settings.batch.with_pool_size(concurrency);
    }
    if let Some(delay) = &args.delay {
        let delay = parse_duration_string(delay).ok_or("Invalid --delay value")?;
        settings.batch = settings.batch.with_delay(delay);
    }
    if let Some(timeout) = &args.timeout {
        let timeout = parse_duration_string(timeout).ok_or("Invalid --timeout value")?;
        settings.batch = settings.batch.with_timeout(timeout);
    }
    if let Some(endpoint) = &args.endpoint {
        settings.batch = settings.batch.with_endpoint(endpoint.as_str());
    }
    if let Some(user_agent) = &args.user_agent {
        settings.batch = settings.batch.with_user_agent(user_agent.as_str());
    }
    if args.suffix.is_some() {
        settings.suffix = args.suffix.clone();
    }
    if args.file.is_some() {
        settings.file = args.file.clone();
    }
    if let Some(directory) = &args.output_dir {
        settings.output_dir = PathBuf::from(directory);
    }

    // Only override boolean settings when the user explicitly passes the flag.
    if args.no_save {
        settings.save = false;
    }
    if args.json {
        settings.json = true;
    }

    Ok(settings)
}

/// Gather prefixes from positional arguments, the prefix file and the lucky dictionary.
fn collect_prefixes(
    args: &Args,
    settings: &Settings,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut prefixes: Vec<String> = args
        .prefixes
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if let Some(file) = &settings.file {
        prefixes.extend(read_prefixes_from_file(file)?);
    }

    if args.lucky {
        let lucky = generate_lucky_numbers(args.lucky_limit);
        info!("Using {} lucky-number prefixes", lucky.len());
        prefixes.extend(lucky);
    }

    Ok(prefixes)
}

/// Read prefixes from a file, one per line.
fn read_prefixes_from_file(file_path: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let path = std::path::Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {}", file_path).into());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", file_path, e))?;
    let prefixes = parse_prefix_lines(&content);

    if prefixes.is_empty() {
        return Err(format!("No prefixes found in {}", file_path).into());
    }

    info!("Read {} prefixes from {}", prefixes.len(), file_path);
    Ok(prefixes)
}

/// Read prefixes typed on stdin until a blank line or end of input.
fn read_prefixes_from_stdin() -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Enter domain prefixes, one per line (blank line to finish):");
    }
    read_prefix_stream(stdin.lock())
}

fn read_prefix_stream<R: BufRead>(reader: R) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut prefixes = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        prefixes.push(trimmed.to_string());
    }
    Ok(prefixes)
}
