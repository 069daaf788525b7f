//! Bulk reverse-geocoding CLI.
//!
//! Reads a CSV with a `Boundary` column, reverse-geocodes each polygon
//! against OSM feature data, and prints a JSON envelope to stdout. Logs go
//! to stderr so stdout stays valid JSON.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rowan::matcher::{FeatureMatcher, DEFAULT_BUFFER_DEGREES};
use rowan::models::AddressRecord;
use rowan::osm::{OverpassClient, TagFilter, DEFAULT_OVERPASS_URL};
use rowan::process::{extract_addresses, BatchOutput};
use rowan::rows::read_boundary_rows;

#[derive(Parser, Debug)]
#[command(name = "geocode")]
#[command(about = "Reverse-geocode CSV boundary polygons against OSM")]
struct Args {
    /// CSV with a 'Boundary' column
    input_file: PathBuf,

    /// Degrees to expand each query bbox
    #[arg(long, default_value_t = DEFAULT_BUFFER_DEGREES)]
    buffer: f64,

    /// Overpass API endpoint
    #[arg(long, default_value = DEFAULT_OVERPASS_URL)]
    overpass_url: String,

    /// Also write the records to a CSV file
    #[arg(long)]
    save_csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Rowan bulk reverse geocoder");
    info!("File: {}", args.input_file.display());

    let file = File::open(&args.input_file)
        .with_context(|| format!("Could not read CSV '{}'", args.input_file.display()))?;
    let rows = read_boundary_rows(file)?;
    info!("Loaded {} rows", rows.len());

    let service = OverpassClient::new(&args.overpass_url)?;
    let matcher = FeatureMatcher::new(service, args.buffer, TagFilter::addresses());

    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let summary = extract_addresses(&rows, &matcher, Some(&pb)).await;
    pb.finish_with_message("Processing complete");

    if let Some(path) = &args.save_csv {
        save_records_csv(path, &summary.records)?;
    }

    let output = BatchOutput::from_summary(summary);
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn save_records_csv(path: &Path, records: &[AddressRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("Failed to create output CSV")?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
