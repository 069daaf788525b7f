//! HTTP server exposing the reverse-geocoding pipeline.
//!
//! Endpoints mirror the worker surface: bulk CSV processing, single-row
//! map rendering, and single-point reverse geocoding.

use std::io::Cursor;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use rowan::matcher::{FeatureMatcher, DEFAULT_BUFFER_DEGREES};
use rowan::models::{AddressRecord, GeoPoint};
use rowan::osm::{
    NominatimClient, OverpassClient, ReverseGeocoder, TagFilter, DEFAULT_NOMINATIM_URL,
    DEFAULT_OVERPASS_URL,
};
use rowan::process::extract_addresses;
use rowan::render::{render_point_map, HttpTileProvider, DEFAULT_TILE_URL};
use rowan::rows::read_boundary_rows;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Boundary reverse-geocoding server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8000")]
    listen: String,

    /// Overpass API endpoint
    #[arg(long, default_value = DEFAULT_OVERPASS_URL)]
    overpass_url: String,

    /// Nominatim endpoint
    #[arg(long, default_value = DEFAULT_NOMINATIM_URL)]
    nominatim_url: String,

    /// Basemap tile URL template with {z}/{x}/{y} placeholders
    #[arg(long, default_value = DEFAULT_TILE_URL)]
    tile_url: String,

    /// Degrees to expand each query bbox
    #[arg(long, default_value_t = DEFAULT_BUFFER_DEGREES)]
    buffer: f64,
}

/// Application state shared across handlers
struct AppState {
    matcher: FeatureMatcher<OverpassClient>,
    geocoder: NominatimClient,
    tiles: HttpTileProvider,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Rowan geocoding server");

    let service = OverpassClient::new(&args.overpass_url)?;
    let state = Arc::new(AppState {
        matcher: FeatureMatcher::new(service, args.buffer, TagFilter::addresses()),
        geocoder: NominatimClient::new(&args.nominatim_url)?,
        tiles: HttpTileProvider::new(&args.tile_url)?,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/bulk-process", post(bulk_process_handler))
        .route("/single-row", post(single_row_handler))
        .route("/reverse-point", post(reverse_point_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: msg.into(),
            details: None,
        }),
    )
}

/// Health check endpoint
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Bulk CSV upload: one address record per matched feature
async fn bulk_process_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Vec<AddressRecord>>, ApiError> {
    let mut csv_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Failed to read upload: {}", e)))?;
            csv_bytes = Some(bytes);
            break;
        }
    }

    let Some(bytes) = csv_bytes else {
        return Err(bad_request("No CSV file uploaded."));
    };

    let rows = read_boundary_rows(Cursor::new(bytes.as_ref()))
        .map_err(|e| bad_request(e.to_string()))?;
    info!("Bulk request with {} rows", rows.len());

    let summary = extract_addresses(&rows, &state.matcher, None).await;
    Ok(Json(summary.records))
}

#[derive(Deserialize)]
struct SingleRowBody {
    #[serde(rename = "Latitude")]
    latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    longitude: Option<f64>,
}

#[derive(Serialize)]
struct MapResponse {
    map: String,
}

/// Render a map for one row's coordinates
async fn single_row_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SingleRowBody>,
) -> Result<Json<MapResponse>, ApiError> {
    let (lat, lon) = match (body.latitude, body.longitude) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => (lat, lon),
        _ => {
            return Err(bad_request(
                "Selected row does not contain valid Latitude or Longitude",
            ))
        }
    };

    let map = render_point_map(&[GeoPoint { lat, lon }], &state.tiles)
        .await
        .map_err(|e| {
            error!("Map render failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Map rendering failed".to_string(),
                    details: Some(format!("{:#}", e)),
                }),
            )
        })?;

    Ok(Json(MapResponse { map }))
}

#[derive(Deserialize)]
struct ReversePointBody {
    lat: f64,
    lon: f64,
}

/// Reverse-geocode a single point
async fn reverse_point_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReversePointBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.geocoder.reverse_geocode(body.lat, body.lon).await {
        Ok(address) => Ok(Json(serde_json::json!({ "address": address }))),
        Err(e) => {
            error!("Reverse geocoding failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                    details: Some(e.details()),
                }),
            ))
        }
    }
}
