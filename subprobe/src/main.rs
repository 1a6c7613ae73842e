//! Subprobe CLI Application
//!
//! A command-line interface for enumerating live subdomains from a wordlist.
//! This CLI application provides a user-friendly interface to the subprobe-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use std::error::Error;
use std::process;
use std::time::Duration;
use subprobe_lib::{
    load_env_config, parse_timeout_string, CandidateQueue, ConfigManager, DnsResolver, FileConfig,
    HickoryBackend, ScanConfig, ScanError, ScanReport, SubdomainScanner, DEFAULT_WORDLIST,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Name resolved by `--test-resolver` when no name is given
const DEFAULT_TEST_NAME: &str = "www.google.com";

/// CLI arguments for subprobe
#[derive(Parser, Debug)]
#[command(name = "subprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Enumerate live subdomains by resolving a wordlist over DNS")]
#[command(
    long_about = "Enumerate live subdomains of a target domain.\n\nEvery label in the wordlist is resolved as <label>.<domain> for A records, with the number of queries in flight bounded by --rate. Names that resolve are reported; names that don't are skipped."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Target domain (e.g. example.com)
    #[arg(value_name = "DOMAIN", help_heading = "Target")]
    pub domain: Option<String>,

    /// Wordlist file with one candidate label per line (default: subnames.txt)
    #[arg(
        short = 'w',
        long = "wordlist",
        value_name = "FILE",
        help_heading = "Target"
    )]
    pub wordlist: Option<String>,

    /// Max concurrent in-flight queries (default: 5000)
    #[arg(short = 'r', long = "rate", value_name = "N", help_heading = "Performance")]
    pub rate: Option<usize>,

    /// Per-query timeout, e.g. 5s, 30s, 2m (default: 5s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Resolver attempts per query (default: 2)
    #[arg(long = "attempts", value_name = "N", help_heading = "Performance")]
    pub attempts: Option<usize>,

    /// Nameservers to query (comma-separated or multiple -n flags)
    #[arg(short = 'n', long = "nameserver", value_name = "IP", value_delimiter = ',', action = clap::ArgAction::Append, help_heading = "Resolver")]
    pub nameservers: Option<Vec<String>>,

    /// Use the operating system's resolver configuration
    #[arg(long = "system-resolver", help_heading = "Resolver")]
    pub system_resolver: bool,

    /// Resolve one name to check the resolver setup, then exit
    #[arg(
        long = "test-resolver",
        value_name = "NAME",
        num_args = 0..=1,
        default_missing_value = DEFAULT_TEST_NAME,
        help_heading = "Resolver"
    )]
    pub test_resolver: Option<String>,

    /// Record type for --test-resolver (A, AAAA, CNAME, MX, NAPTR, NS, PTR, SOA, SRV, TXT)
    #[arg(
        long = "query-type",
        value_name = "TYPE",
        default_value = "A",
        help_heading = "Resolver"
    )]
    pub query_type: String,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Output results in CSV format
    #[arg(long = "csv", help_heading = "Output Format")]
    pub csv: bool,

    /// Enable styled output with a header and aligned columns
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Collect all results before displaying
    #[arg(long = "batch", help_heading = "Output Format")]
    pub batch: bool,

    /// Show results as they resolve
    #[arg(long = "streaming", help_heading = "Output Format")]
    pub streaming: bool,

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

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// Everything a run needs after config files, environment and CLI are merged.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub(crate) scan: ScanConfig,
    pub(crate) wordlist: String,
    pub(crate) format: OutputFormat,
    pub(crate) pretty: bool,
    pub(crate) csv_headers: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            wordlist: DEFAULT_WORDLIST.to_string(),
            format: OutputFormat::Text,
            pretty: false,
            csv_headers: true,
        }
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

    init_logging(&args);
    info!("subprobe v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(exit_code(e.as_ref()));
    }
}

/// Wordlist load failures exit with 2, everything else with 1.
fn exit_code(err: &(dyn Error + 'static)) -> i32 {
    match err.downcast_ref::<ScanError>() {
        Some(ScanError::Load { .. }) => 2,
        _ => 1,
    }
}

fn validate_args(args: &Args) -> Result<(), String> {
    // --test-resolver needs no target
    if args.domain.is_none() && args.test_resolver.is_none() {
        return Err(
            "You must specify a target domain, or use --test-resolver to check the resolver"
                .to_string(),
        );
    }

    if args.rate == Some(0) {
        return Err("Rate must be a positive integer".to_string());
    }

    if args.attempts == Some(0) {
        return Err("Attempts must be at least 1".to_string());
    }

    if let Some(timeout) = &args.timeout {
        match parse_timeout_string(timeout) {
            Some(secs) if secs > 0 => {}
            _ => {
                return Err(format!(
                    "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                    timeout
                ))
            }
        }
    }

    if args.system_resolver && args.nameservers.is_some() {
        return Err("Cannot use --system-resolver together with --nameserver".to_string());
    }

    // Can't have conflicting output modes
    if args.batch && args.streaming {
        return Err("Cannot specify both --batch and --streaming modes".to_string());
    }

    // Can't have multiple output formats
    if args.json && args.csv {
        return Err("Cannot specify multiple output formats (--json, --csv)".to_string());
    }

    // Streaming mode doesn't support structured output formats
    if args.streaming && (args.json || args.csv) {
        return Err(
            "Cannot use --streaming with --json or --csv. Use --batch for structured output"
                .to_string(),
        );
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the flags.
fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(args.debug)
        .init();
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let settings = build_settings(&args)?;
    debug!(?settings, "resolved settings");

    if let Some(name) = &args.test_resolver {
        return run_resolver_test(&settings, name, &args.query_type).await;
    }

    let domain = args
        .domain
        .as_deref()
        .ok_or("You must specify a target domain")?;

    // A missing or unreadable wordlist aborts before any query is sent
    let queue = CandidateQueue::from_file(&settings.wordlist)?;
    let scanner = SubdomainScanner::new(domain, settings.scan.clone(), queue)?;

    if should_use_streaming(&args, &settings) {
        run_streaming_scan(&scanner, &settings).await
    } else {
        run_batch_scan(&scanner, &settings).await
    }
}

/// Determine whether to use streaming or batch mode
fn should_use_streaming(args: &Args, settings: &RunSettings) -> bool {
    // Force batch mode if explicitly requested
    if args.batch {
        return false;
    }

    // Force streaming mode if explicitly requested
    if args.streaming {
        return true;
    }

    // Structured output is only written once the scan is complete
    settings.format == OutputFormat::Text
}

/// Print each subdomain as soon as it resolves.
async fn run_streaming_scan(
    scanner: &SubdomainScanner,
    settings: &RunSettings,
) -> Result<(), Box<dyn Error>> {
    if settings.pretty {
        ui::print_header(scanner.domain(), scanner.pending(), scanner.config());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = async {
        let mut shown = 0usize;
        while let Some(record) = rx.recv().await {
            shown += 1;
            ui::print_record(&record, settings.pretty, Some(shown));
        }
    };

    let (report, ()) = tokio::join!(scanner.run_with_sink(tx), printer);

    ui::print_summary(&report.summary, settings.pretty);
    Ok(())
}

/// Run the whole scan, then display every result at once.
async fn run_batch_scan(
    scanner: &SubdomainScanner,
    settings: &RunSettings,
) -> Result<(), Box<dyn Error>> {
    let is_structured = settings.format != OutputFormat::Text;

    if settings.pretty && !is_structured {
        ui::print_header(scanner.domain(), scanner.pending(), scanner.config());
    }

    // Spinner::start returns None if stderr isn't a TTY.
    let spinner = if !is_structured {
        ui::Spinner::start(format!(
            "Resolving {} candidates under {}...",
            scanner.pending(),
            scanner.domain()
        ))
    } else {
        None
    };

    let report = scanner.run().await;

    if let Some(s) = spinner {
        s.stop().await;
    }

    display_results(&report, settings)
}

/// Resolve a single name with the configured resolver and print the answer.
async fn run_resolver_test(
    settings: &RunSettings,
    name: &str,
    query_type: &str,
) -> Result<(), Box<dyn Error>> {
    settings.scan.validate()?;
    let backend = HickoryBackend::from_config(&settings.scan)?;
    let resolver = DnsResolver::new(backend);

    info!(name, query_type, "testing resolver");
    let record = resolver.query(name, query_type).await?;

    match settings.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Csv => {
            if settings.csv_headers {
                println!("domain,addresses");
            }
            println!("{}", ui::csv_line(&record));
        }
        OutputFormat::Text => ui::print_record(&record, settings.pretty, None),
    }

    Ok(())
}

/// Build run settings from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (SP_*)
/// 3. Local config file (./subprobe.toml or ./.subprobe.toml)
/// 4. Global config file (~/.subprobe.toml)
/// 5. XDG config file (~/.config/subprobe/config.toml)
/// 6. Built-in defaults
fn build_settings(args: &Args) -> Result<RunSettings, Box<dyn Error>> {
    let mut settings = RunSettings::default();
    let config_manager = ConfigManager::new();
    let env_config = load_env_config();

    // Step 1: Determine config file path and load config files
    let explicit_config = args.config.clone().or_else(|| env_config.config.clone());
    if let Some(path) = explicit_config {
        info!(path = %path, "using explicit config file");
        let file_config = config_manager
            .load_file(&path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?;
        settings = merge_file_config(settings, file_config);
    } else {
        match config_manager.discover_and_load() {
            Ok(file_config) => settings = merge_file_config(settings, file_config),
            Err(e) => warn!(error = %e, "config discovery failed, using defaults"),
        }
    }

    // Step 2: Apply environment variables (SP_*)
    if env_config.has_output_format_conflict() {
        warn!("both SP_JSON and SP_CSV are set, CLI args will resolve conflict");
    }
    if let Some(rate) = env_config.rate {
        settings.scan = settings.scan.with_rate(rate);
    }
    if let Some(nameservers) = env_config.nameservers {
        settings.scan = settings.scan.with_nameservers(nameservers);
    }
    if let Some(secs) = env_config.timeout.as_deref().and_then(parse_timeout_string) {
        settings.scan = settings.scan.with_timeout(Duration::from_secs(secs));
    }
    if let Some(attempts) = env_config.attempts {
        settings.scan = settings.scan.with_attempts(attempts);
    }
    if let Some(wordlist) = env_config.wordlist {
        settings.wordlist = wordlist;
    }
    if let Some(pretty) = env_config.pretty {
        settings.pretty = pretty;
    }
    if env_config.json == Some(true) {
        settings.format = OutputFormat::Json;
    } else if env_config.csv == Some(true) {
        settings.format = OutputFormat::Csv;
    }

    // Step 3: Apply CLI arguments (highest precedence)
    Ok(apply_cli_args(settings, args))
}

/// Merge FileConfig into RunSettings
fn merge_file_config(mut settings: RunSettings, file_config: FileConfig) -> RunSettings {
    if let Some(defaults) = file_config.defaults {
        if let Some(rate) = defaults.rate {
            settings.scan = settings.scan.with_rate(rate);
        }
        if let Some(nameservers) = defaults.nameservers {
            settings.scan = settings.scan.with_nameservers(nameservers);
        }
        if let Some(secs) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
            settings.scan = settings.scan.with_timeout(Duration::from_secs(secs));
        }
        if let Some(attempts) = defaults.attempts {
            settings.scan = settings.scan.with_attempts(attempts);
        }
        if let Some(wordlist) = defaults.wordlist {
            settings.wordlist = wordlist;
        }
        if let Some(pretty) = defaults.pretty {
            settings.pretty = pretty;
        }
    }

    if let Some(output) = file_config.output {
        match output.default_format.as_deref() {
            Some("json") => settings.format = OutputFormat::Json,
            Some("csv") => settings.format = OutputFormat::Csv,
            Some("text") => settings.format = OutputFormat::Text,
            _ => {}
        }
        if let Some(csv_headers) = output.csv_headers {
            settings.csv_headers = csv_headers;
        }
    }

    settings
}

/// Apply CLI arguments to settings (highest precedence).
fn apply_cli_args(mut settings: RunSettings, args: &Args) -> RunSettings {
    if let Some(rate) = args.rate {
        settings.scan = settings.scan.with_rate(rate);
    }
    if let Some(nameservers) = &args.nameservers {
        settings.scan = settings.scan.with_nameservers(nameservers.iter().cloned());
    }
    if args.system_resolver {
        settings.scan = settings.scan.with_system_resolver();
    }
    if let Some(secs) = args.timeout.as_deref().and_then(parse_timeout_string) {
        settings.scan = settings.scan.with_timeout(Duration::from_secs(secs));
    }
    if let Some(attempts) = args.attempts {
        settings.scan = settings.scan.with_attempts(attempts);
    }
    if let Some(wordlist) = &args.wordlist {
        settings.wordlist = wordlist.clone();
    }

    // Only override boolean settings when the user explicitly passes the flag.
    if args.pretty {
        settings.pretty = true;
    }
    if args.json {
        settings.format = OutputFormat::Json;
    } else if args.csv {
        settings.format = OutputFormat::Csv;
    }

    settings
}

fn display_results(report: &ScanReport, settings: &RunSettings) -> Result<(), Box<dyn Error>> {
    match settings.format {
        OutputFormat::Json => display_json_results(report, settings.pretty)?,
        OutputFormat::Csv => display_csv_results(report, settings.csv_headers),
        OutputFormat::Text => display_text_results(report, settings.pretty),
    }

    Ok(())
}

/// Display results in JSON format
fn display_json_results(report: &ScanReport, pretty: bool) -> Result<(), Box<dyn Error>> {
    println!("{}", report.to_json(pretty)?);
    Ok(())
}

/// Display results in CSV format
fn display_csv_results(report: &ScanReport, headers: bool) {
    if headers {
        println!("domain,addresses");
    }
    for record in &report.records {
        println!("{}", ui::csv_line(record));
    }
}

/// Display results in human-readable text format
fn display_text_results(report: &ScanReport, pretty: bool) {
    for record in &report.records {
        ui::print_record(record, pretty, None);
    }
    ui::print_summary(&report.summary, pretty);
}
