//! Point map rendering CLI.
//!
//! Reads a CSV with `Latitude`/`Longitude` columns, renders all points
//! over a basemap, and prints `{"map": "<base64 PNG>"}` to stdout.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rowan::models::GeoPoint;
use rowan::render::{render_point_map_png, HttpTileProvider, DEFAULT_TILE_URL};
use rowan::rows::read_point_rows;

#[derive(Parser, Debug)]
#[command(name = "plot")]
#[command(about = "Render CSV points onto a basemap")]
struct Args {
    /// CSV with 'Latitude' and 'Longitude' columns
    input_file: PathBuf,

    /// Basemap tile URL template with {z}/{x}/{y} placeholders
    #[arg(long, default_value = DEFAULT_TILE_URL)]
    tile_url: String,

    /// Also write the rendered PNG to a file
    #[arg(long)]
    out: Option<PathBuf>,
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
    let file = File::open(&args.input_file)
        .with_context(|| format!("Could not read CSV '{}'", args.input_file.display()))?;
    let rows = read_point_rows(file)?;
    info!("Rendering {} points", rows.len());

    let points: Vec<GeoPoint> = rows
        .iter()
        .map(|r| GeoPoint {
            lat: r.latitude,
            lon: r.longitude,
        })
        .collect();

    let provider = HttpTileProvider::new(&args.tile_url)?;
    let png = render_point_map_png(&points, &provider).await?;

    if let Some(path) = &args.out {
        std::fs::write(path, &png)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        info!("Wrote {}", path.display());
    }

    println!("{}", serde_json::json!({ "map": BASE64.encode(&png) }));

    Ok(())
}
