//! B-jet efficiency corrector CLI
//!
//! Runs the corrector over a JSON event file and prints per-event results.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use btag_core::{BtagCorrector, CorrectorConfig, Event, EventCorrections, OutputRecorder};

#[derive(Parser)]
#[command(name = "btag_cli")]
#[command(about = "Apply b-tagging decisions and efficiency scale factors", long_about = None)]
struct Cli {
    /// Corrector configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Event file: a JSON array of events
    #[arg(long)]
    events: PathBuf,

    /// Write full per-event results as JSON to this path
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = CorrectorConfig::from_file(&cli.config)
        .with_context(|| format!("reading config {}", cli.config.display()))?;
    let mut corrector = BtagCorrector::new(config).context("corrector setup failed")?;

    let events_text = std::fs::read_to_string(&cli.events)
        .with_context(|| format!("reading events {}", cli.events.display()))?;
    let events: Vec<Event> =
        serde_json::from_str(&events_text).context("event file is not a JSON array of events")?;

    log::info!(
        "Processing {} events at operating point {}",
        events.len(),
        corrector.operating_point().name()
    );

    let mut results: Vec<EventCorrections> = Vec::new();
    let mut skipped = 0usize;

    for (index, event) in events.iter().enumerate() {
        let mut recorder = OutputRecorder::new();
        match corrector
            .process_event(event)
            .with_context(|| format!("event {index} failed"))?
        {
            Some(result) => {
                recorder.record(result.output_key.clone(), result.variation_names.clone())?;
                print_summary(index, &result);
                results.push(result);
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        println!("{skipped} data events skipped");
    }

    if let Some(out) = &cli.out {
        std::fs::write(out, serde_json::to_string_pretty(&results)?)
            .with_context(|| format!("writing {}", out.display()))?;
        println!("Results written to {}", out.display());
    }

    Ok(())
}

fn print_summary(index: usize, result: &EventCorrections) {
    let tagged = result.jets.iter().filter(|j| j.tagged == Some(true)).count();
    println!(
        "event {index}: {} jets, {tagged} tagged, {} variations [{}]",
        result.jets.len(),
        result.variation_names.len(),
        result.output_key
    );
    for (jet_index, jet) in result.jets.iter().enumerate() {
        if let Some(sequence) = &jet.scale_factors {
            println!("  jet {jet_index}: tagged={:?} sf={sequence:?}", jet.tagged);
        } else {
            println!("  jet {jet_index}: tagged={:?}", jet.tagged);
        }
    }
}
