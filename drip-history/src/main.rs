use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use libdripcast::config::{expand_path, Config, SelectionMode};
use libdripcast::selector::{CyclePolicy, SequentialPolicy, SlotPolicy};
use libdripcast::slot::SlotClock;
use libdripcast::{ContentQueue, Ledger};

#[derive(Parser, Debug)]
#[command(name = "drip-history")]
#[command(version, about = "Query posting history and queue progress")]
#[command(long_about = r#"Query posting history and queue progress.

Read-only view over the ledger file: posted count, remaining items, the
next candidate index, and the recorded entries (newest first).

EXAMPLES:
    # Summary plus the last 20 entries
    drip-history

    # Show more entries
    drip-history --limit 50

    # Search recorded content
    drip-history --search "release"

    # JSON output for scripting
    drip-history --format json | jq '.posted'

    # JSONL output (one entry per line)
    drip-history --format jsonl

EXIT CODES:
    0 - Success (including empty history)
    1 - Error (unreadable files, bad config)
"#)]
struct Args {
    /// Config file path
    #[arg(short, long, env = "DRIPCAST_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ledger file (overrides config)
    #[arg(long, value_name = "PATH")]
    ledger: Option<String>,

    /// Queue file for progress computation (overrides config)
    #[arg(long, value_name = "PATH")]
    queue: Option<String>,

    /// Show entries containing this text (case-insensitive substring)
    #[arg(short, long, value_name = "TERM")]
    search: Option<String>,

    /// Maximum number of entries to show
    #[arg(short, long, default_value = "20", value_name = "N")]
    limit: usize,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json", "jsonl"])]
    format: String,
}

/// One recorded publish, positioned chronologically (1-based)
#[derive(Debug, Serialize)]
struct HistoryEntry {
    position: usize,
    external_id: String,
    duplicate: bool,
    content: String,
}

#[derive(Debug, Serialize)]
struct HistoryReport {
    posted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_index: Option<usize>,
    entries: Vec<HistoryEntry>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(?args, "drip-history started");

    let config = match &args.config {
        Some(path) => Config::load_from_path(path).context("Failed to load configuration")?,
        None => Config::load_or_default().context("Failed to load configuration")?,
    };

    let ledger_path = expand_path(args.ledger.as_deref().unwrap_or(&config.ledger.path));
    let ledger = Ledger::new(ledger_path);
    let all_entries = ledger.read_all().context("Failed to read ledger")?;
    let posted = all_entries.len();

    // Progress is best-effort: the history view still works when the
    // queue file is absent.
    let queue_path = expand_path(args.queue.as_deref().unwrap_or(&config.queue.path));
    let progress = ContentQueue::load(&queue_path, config.queue.format)
        .ok()
        .map(|queue| {
            let policy: Box<dyn CyclePolicy> = match config.selector.mode {
                SelectionMode::Sequential => Box::new(SequentialPolicy),
                SelectionMode::Slot => {
                    let hour = SlotClock::from_offset_minutes(config.selector.utc_offset_minutes)
                        .map(|clock| clock.current_hour())
                        .unwrap_or(0);
                    Box::new(SlotPolicy::at_hour(hour))
                }
            };
            let pick = policy.pick(queue.len(), posted);
            (queue.len(), queue.len().saturating_sub(posted), pick.index)
        });

    let search = args.search.as_deref().map(str::to_lowercase);
    let entries: Vec<HistoryEntry> = all_entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| match &search {
            Some(term) => entry.text.to_lowercase().contains(term),
            None => true,
        })
        .map(|(i, entry)| HistoryEntry {
            position: i + 1,
            external_id: entry.external_id.clone(),
            duplicate: entry.is_duplicate_marker(),
            content: entry.text.clone(),
        })
        .rev()
        .take(args.limit)
        .collect();

    let report = HistoryReport {
        posted,
        queue_len: progress.map(|(len, _, _)| len),
        remaining: progress.map(|(_, remaining, _)| remaining),
        next_index: progress.map(|(_, _, next)| next),
        entries,
    };

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "jsonl" => {
            for entry in &report.entries {
                println!("{}", serde_json::to_string(entry)?);
            }
        }
        _ => {
            print_text(&report);
        }
    }

    Ok(())
}

fn print_text(report: &HistoryReport) {
    println!("posted: {}", report.posted);
    if let (Some(len), Some(remaining), Some(next)) =
        (report.queue_len, report.remaining, report.next_index)
    {
        println!("queue: {} items, {} remaining, next index {}", len, remaining, next);
    }

    if report.entries.is_empty() {
        return;
    }

    println!();
    for entry in &report.entries {
        let marker = if entry.duplicate { "~" } else { "✓" };
        println!(
            "{} #{} | {} | {}",
            marker,
            entry.position,
            entry.external_id,
            truncate(&entry.content)
        );
    }
}

/// Shorten content for one-line display
fn truncate(text: &str) -> String {
    const MAX: usize = 60;
    if text.chars().count() > MAX {
        let head: String = text.chars().take(MAX).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
