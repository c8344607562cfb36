//! CLI commands for baken-predictor.
//!
//! Supports both API server mode and batch resolution from a JSON file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::predictor::resolve_batch;
use crate::types::{FailureReport, ResolveRequest, ResolveResponse};

#[derive(Parser)]
#[command(name = "baken-predictor")]
#[command(version, about = "Infer a bettor's favorite and rival picks from wager history", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },

    /// Resolve races from a batch JSON file
    Resolve {
        /// Path to batch JSON (tickets and race cards keyed by race id)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output format (json, table)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run batch resolution from a file.
pub fn run_resolve(input: PathBuf, format: String, output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let input_json = std::fs::read_to_string(&input)?;
    let req: ResolveRequest = serde_json::from_str(&input_json)?;

    eprintln!("Races: {}", req.tickets.len());

    let outcome = resolve_batch(&req.tickets, &req.races, &config.predictor);
    let response = ResolveResponse {
        records: outcome.records,
        failures: outcome
            .failures
            .into_iter()
            .map(|failure| FailureReport {
                race_id: failure.race_id,
                error: failure.error.to_string(),
            })
            .collect(),
    };

    let rendered = match format.as_str() {
        "table" => render_table(&response),
        _ => serde_json::to_string_pretty(&response)?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }

    for failure in &response.failures {
        eprintln!("failed: {} ({})", failure.race_id, failure.error);
    }

    Ok(())
}

/// Render records as an aligned text table.
fn render_table(response: &ResolveResponse) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<20} {:>8} {:>8} {:>10} {:>12} {:>8}\n",
        "race", "favorite", "rival", "payment", "repayment", "hits"
    ));
    for record in &response.records {
        let favorite = record
            .favorite
            .as_ref()
            .map(|h| h.horse_number.to_string())
            .unwrap_or_else(|| "-".to_string());
        let rival = record
            .rival
            .as_ref()
            .map(|h| h.horse_number.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<20} {:>8} {:>8} {:>10} {:>12} {:>8}\n",
            record.race_id,
            favorite,
            rival,
            record.total_payment,
            record.total_repayment,
            record.winning_tickets.len()
        ));
    }
    out
}
