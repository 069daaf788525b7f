//! Nominatim reverse-geocoding client.

use anyhow::Context;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use super::ReverseGeocoder;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

const USER_AGENT: &str = "Rowan/0.1 (boundary reverse geocoder)";
const REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding service unavailable or timed out")]
    Unavailable(#[source] reqwest::Error),
    #[error("Unexpected error")]
    Unexpected(#[source] anyhow::Error),
}

impl GeocodeError {
    /// Underlying error text, for diagnostic payloads.
    pub fn details(&self) -> String {
        match self {
            GeocodeError::Unavailable(e) => e.to_string(),
            GeocodeError::Unexpected(e) => format!("{:#}", e),
        }
    }
}

/// Reverse geocoder backed by the Nominatim HTTP API.
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    /// Absent when Nominatim cannot resolve the coordinates.
    display_name: Option<String>,
}

impl NominatimClient {
    /// `endpoint` is the service root, e.g. `https://nominatim.openstreetmap.org`.
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint).context("Invalid Nominatim endpoint URL")?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, endpoint })
    }
}

impl ReverseGeocoder for NominatimClient {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<String, GeocodeError> {
        let url = self
            .endpoint
            .join("reverse")
            .map_err(|e| GeocodeError::Unexpected(e.into()))?;

        let response = self
            .client
            .get(url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            return Err(GeocodeError::Unexpected(anyhow::anyhow!(
                "Nominatim returned status {}",
                response.status()
            )));
        }

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Unexpected(e.into()))?;

        Ok(body.display_name.unwrap_or_else(|| "N/A".to_string()))
    }
}

fn classify(err: reqwest::Error) -> GeocodeError {
    if err.is_timeout() || err.is_connect() {
        GeocodeError::Unavailable(err)
    } else {
        GeocodeError::Unexpected(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_response_parsing() {
        let json = r#"{"place_id": 1, "display_name": "12, Main St, Zurich"}"#;
        let parsed: ReverseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.display_name.as_deref(), Some("12, Main St, Zurich"));

        // Nominatim reports unresolvable coordinates as an error body
        let json = r#"{"error": "Unable to geocode"}"#;
        let parsed: ReverseResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.display_name.is_none());
    }
}
