//! drip-post - publish the next queued item
//!
//! One invocation, one publish at most. An external scheduler (cron, CI)
//! fires this binary; progress lives in the ledger file, so invocations
//! are stateless and composable. Runs against a given ledger must be
//! serialized by the scheduler: concurrent invocations can double-post.

use clap::Parser;
use std::path::PathBuf;

use libdripcast::config::{expand_path, Config, SelectionMode};
use libdripcast::logging::{self, LogFormat, LoggingConfig};
use libdripcast::publisher::{CommandPublisher, MockPublisher, Publisher};
use libdripcast::runner::{Preview, RunReport};
use libdripcast::selector::{CyclePolicy, SequentialPolicy, SlotPolicy};
use libdripcast::slot::SlotClock;
use libdripcast::types::RunOutcome;
use libdripcast::{ContentQueue, DripcastError, Ledger, Result, Runner};

#[derive(Parser, Debug)]
#[command(name = "drip-post")]
#[command(version, about = "Publish the next item from the content queue", long_about = r#"Publish the next item from the content queue.

Selects the next item from the queue file based on the history ledger,
publishes it through the configured publisher command, and records the
outcome. Designed to be fired by an external scheduler; each run is
stateless and publishes at most one item.

EXIT CODES:
    0 - posted, skipped (already in history), or duplicate-compensated
    1 - configuration or publish failure
    2 - rate limited (safe to retry at the next slot)
    3 - invalid input
    4 - published remotely but failed to record in the ledger
"#)]
struct Cli {
    /// Config file path
    #[arg(short, long, env = "DRIPCAST_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Queue file (overrides config)
    #[arg(long, value_name = "PATH")]
    queue: Option<String>,

    /// Ledger file (overrides config)
    #[arg(long, value_name = "PATH")]
    ledger: Option<String>,

    /// Selection mode (overrides config)
    #[arg(long, value_parser = ["sequential", "slot"])]
    mode: Option<String>,

    /// Slot clock hour override, 0-23 (reproducible slot-mode runs)
    #[arg(long, value_name = "HOUR")]
    at_hour: Option<u32>,

    /// Select and report only: no publish, no history write
    #[arg(long)]
    dry_run: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        LoggingConfig::new(LogFormat::Text, "debug".to_string(), true).init();
    } else {
        logging::init_default();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        eprintln!("status: {}", e.status());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_or_default()?,
    };

    let queue_path = expand_path(cli.queue.as_deref().unwrap_or(&config.queue.path));
    let ledger_path = expand_path(cli.ledger.as_deref().unwrap_or(&config.ledger.path));

    let queue = ContentQueue::load(&queue_path, config.queue.format)?;
    let ledger = Ledger::new(ledger_path);

    let mode = match cli.mode.as_deref() {
        Some("sequential") => SelectionMode::Sequential,
        Some("slot") => SelectionMode::Slot,
        Some(other) => {
            return Err(DripcastError::InvalidInput(format!(
                "unknown selection mode: {}",
                other
            )))
        }
        None => config.selector.mode,
    };

    let policy: Box<dyn CyclePolicy> = match mode {
        SelectionMode::Sequential => Box::new(SequentialPolicy),
        SelectionMode::Slot => {
            let hour = match cli.at_hour {
                Some(hour) if hour > 23 => {
                    return Err(DripcastError::InvalidInput(format!(
                        "hour must be 0-23, got {}",
                        hour
                    )))
                }
                Some(hour) => hour,
                None => SlotClock::from_offset_minutes(config.selector.utc_offset_minutes)?
                    .current_hour(),
            };
            Box::new(SlotPolicy::at_hour(hour))
        }
    };

    let publisher: Box<dyn Publisher> = if cli.dry_run {
        Box::new(MockPublisher::success("dry-run"))
    } else {
        Box::new(CommandPublisher::from_config(&config.publisher)?)
    };

    let runner = Runner::new(
        &queue,
        &ledger,
        publisher.as_ref(),
        policy,
        config.retry.clone(),
    );

    if cli.dry_run {
        let preview = runner.preview()?;
        print_preview(&preview, &cli.format)?;
    } else {
        let report = runner.run().await?;
        print_report(&report, &cli.format)?;
    }

    Ok(())
}

fn print_report(report: &RunReport, format: &str) -> Result<()> {
    if format == "json" {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| DripcastError::InvalidInput(format!("serialization failed: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    println!("status: {}", report.outcome.status());
    if report.cycle_reset {
        println!("cycle complete, history cleared");
    }

    let position = format!("item {} of {}{}", report.index + 1, report.queue_len, coordinate_suffix(report.day, report.slot));
    match &report.outcome {
        RunOutcome::Posted { external_id } => {
            println!("✓ posted {}: \"{}\" (id {})", position, truncate(&report.text), external_id);
        }
        RunOutcome::AlreadyPosted => {
            println!("- already in history, nothing to publish: \"{}\"", truncate(&report.text));
        }
        RunOutcome::DuplicateCompensated => {
            println!("✓ remote already had {}, marker recorded: \"{}\"", position, truncate(&report.text));
        }
    }
    println!("progress: {} posted, {} remaining", report.posted_count, report.remaining);
    Ok(())
}

fn print_preview(preview: &Preview, format: &str) -> Result<()> {
    if format == "json" {
        let json = serde_json::to_string_pretty(preview)
            .map_err(|e| DripcastError::InvalidInput(format!("serialization failed: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    println!("status: {}", preview.status);
    if preview.would_reset {
        println!("cycle complete, a real run would clear the history first");
    }
    let position = format!("item {} of {}{}", preview.index + 1, preview.queue_len, coordinate_suffix(preview.day, preview.slot));
    if preview.status == "skipped" {
        println!("- already in history, nothing to publish: \"{}\"", truncate(&preview.text));
    } else {
        println!("→ would post {}: \"{}\"", position, truncate(&preview.text));
    }
    Ok(())
}

fn coordinate_suffix(day: Option<u32>, slot: Option<u8>) -> String {
    match (day, slot) {
        (Some(day), Some(slot)) => format!(" (day {}, slot {})", day, slot),
        _ => String::new(),
    }
}

/// Shorten content for one-line status output
fn truncate(text: &str) -> String {
    const MAX: usize = 60;
    if text.chars().count() > MAX {
        let head: String = text.chars().take(MAX).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
