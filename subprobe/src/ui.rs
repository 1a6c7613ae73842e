//! Display logic for the subprobe CLI.
//!
//! This module handles terminal output: result lines, the `--pretty` header
//! and summary bar, CSV lines, and the stderr spinner. Uses only the
//! `console` crate.

use console::{pad_str, style, Alignment, Term};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use subprobe_lib::{ResolvedRecord, ScanConfig, ScanSummary};

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a new spinner with the given message.
    ///
    /// Returns `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a pretty run.
pub fn print_header(domain: &str, candidates: usize, config: &ScanConfig) {
    println!(
        "{} {} {}",
        style("subprobe").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "— Resolving {} candidate{} under {}",
            candidates,
            if candidates == 1 { "" } else { "s" },
            domain
        ))
        .dim(),
    );
    println!("{}", style(header_meta(config)).dim());
    println!();
}

fn header_meta(config: &ScanConfig) -> String {
    let resolvers = if config.nameservers.is_empty() {
        "system".to_string()
    } else {
        config.nameservers.join(", ")
    };

    format!(
        "Rate: {} | Timeout: {}s | Nameservers: {}",
        config.rate,
        config.timeout.as_secs(),
        resolvers
    )
}

// ── Result lines ─────────────────────────────────────────────────────────────

/// Print one resolved name.
///
/// Plain mode prints `name addr1,addr2` for easy piping. Pretty mode pads
/// the name and, if `counter` is set, prefixes a running count like `[3]`.
pub fn print_record(record: &ResolvedRecord, pretty: bool, counter: Option<usize>) {
    if !pretty {
        println!("{}", plain_line(record));
        return;
    }

    let padded = pad_str(&record.domain, 40, Alignment::Left, Some(".."));
    let prefix = match counter {
        Some(n) => format!("{} ", style(format!("[{}]", n)).dim()),
        None => String::new(),
    };

    println!(
        "  {}{}  {}",
        prefix,
        style(&padded).green().bold(),
        style(record.addresses.join(", ")).dim(),
    );
}

fn plain_line(record: &ResolvedRecord) -> String {
    format!("{} {}", record.domain, record.addresses.join(","))
}

/// Format a record as one CSV row (`domain,addresses`), with the addresses
/// joined by `;`.
pub fn csv_line(record: &ResolvedRecord) -> String {
    format!("{},{}", record.domain, record.addresses.join(";"))
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final `N found out of M` line.
pub fn print_summary(summary: &ScanSummary, pretty: bool) {
    if !pretty {
        println!("{}", summary);
        return;
    }

    println!();
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {}  {}  {} in {:.1}s",
        style(summary.to_string()).bold(),
        style("|").dim(),
        summary.domain,
        summary.elapsed.as_secs_f64(),
    );
}

// ── Tests ────────────────────────────────────────────────────────────────────
