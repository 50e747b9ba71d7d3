//! # CLI Module
//!
//! Front end of the `signer` binary.
//!
//! Items come from stdin (one per line) when it is piped, otherwise the
//! demo dataset is used. Lines that parse as integers become integer items.
//! Progress and the run summary go to stderr; the combined signature is the
//! only thing written to stdout.

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use signer_pipeline::core::digest::{Delayed, Digests, Md5Digest, Xxh32Digest};
use signer_pipeline::core::{Item, Pipeline, PipelineResult};
use signer_pipeline::error::Result;
use signer_pipeline::events::{Event, EventChannel, PipelineEvent, StageEvent};
use std::io::{self, BufRead, IsTerminal};
use std::thread;
use std::time::Duration;

/// Used when nothing is piped in
const DEMO_ITEMS: [i64; 7] = [0, 1, 1, 2, 3, 5, 8];

/// Simulated round trip of the limited backend
const LIMITED_LATENCY: Duration = Duration::from_millis(10);

/// Run the CLI
pub fn run() -> Result<()> {
    signer_pipeline::init_tracing();
    let term = Term::stderr();

    let items = read_items()?;

    term.write_line(&format!(
        "{} {}",
        style("Signer Pipeline").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();

    let digests = Digests::new(
        Md5Digest,
        Delayed::new(Xxh32Digest::default(), LIMITED_LATENCY),
    );
    let pipeline = Pipeline::signer(digests);

    let (sender, receiver) = EventChannel::new();

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::Started {
                    total_items,
                    stages,
                    ..
                }) => {
                    // Every stage but the last reports one result per item
                    let expected = total_items * stages.len().saturating_sub(1) + 1;
                    progress_clone.set_length(expected as u64);
                }
                Event::Stage(StageEvent::ItemCompleted(item)) => {
                    progress_clone.inc(1);
                    progress_clone.set_message(item.stage);
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    progress_clone.finish_and_clear();
                }
                Event::Pipeline(PipelineEvent::Failed { .. }) => {
                    progress_clone.abandon();
                }
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(items, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let result = result?;
    print_summary(&term, &result);

    let combined = result.into_single_text()?;
    println!("{}", combined);

    Ok(())
}

fn read_items() -> Result<Vec<Item>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(DEMO_ITEMS.iter().copied().map(Item::from).collect());
    }

    let mut items = Vec::new();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        items.push(parse_item(line));
    }
    Ok(items)
}

fn parse_item(line: &str) -> Item {
    line.parse::<i64>()
        .map(Item::Int)
        .unwrap_or_else(|_| Item::from(line))
}

fn print_summary(term: &Term, result: &PipelineResult) {
    term.write_line(&format!(
        "{} Signed {} items in {:.1}s",
        style("✓").green().bold(),
        style(result.items_in).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} limited digest calls (peak concurrency {})",
        style(result.limiter.acquisitions).cyan(),
        style(result.limiter.peak_concurrency).yellow()
    ))
    .ok();

    term.write_line(&format!("  {} {}", style("run").dim(), style(result.run_id).dim()))
        .ok();
    term.write_line("").ok();
}
