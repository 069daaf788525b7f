//! Single-point reverse-geocoding CLI.
//!
//! Resolves one coordinate pair to an address via Nominatim and prints a
//! JSON object to stdout. Service failures are reported in the JSON body,
//! not via the exit code.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use rowan::osm::{NominatimClient, ReverseGeocoder, DEFAULT_NOMINATIM_URL};

#[derive(Parser, Debug)]
#[command(name = "lookup")]
#[command(about = "Reverse-geocode a single coordinate pair")]
#[command(allow_negative_numbers = true)]
struct Args {
    /// Latitude in degrees
    lat: f64,

    /// Longitude in degrees
    lon: f64,

    /// Nominatim endpoint
    #[arg(long, default_value = DEFAULT_NOMINATIM_URL)]
    nominatim_url: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();

    let geocoder = match NominatimClient::new(&args.nominatim_url) {
        Ok(geocoder) => geocoder,
        Err(e) => {
            println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            return ExitCode::FAILURE;
        }
    };

    match geocoder.reverse_geocode(args.lat, args.lon).await {
        Ok(address) => {
            println!("{}", serde_json::json!({ "address": address }));
        }
        Err(e) => {
            println!(
                "{}",
                serde_json::json!({ "error": e.to_string(), "details": e.details() })
            );
        }
    }

    ExitCode::SUCCESS
}
