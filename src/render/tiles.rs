//! Basemap tile fetching.

use std::future::Future;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use reqwest::Client;

use super::mercator::TILE_SIZE;

pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

const USER_AGENT: &str = "Rowan/0.1 (point map renderer)";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Fetches basemap raster tiles.
pub trait TileProvider {
    fn fetch_tile(&self, zoom: u8, x: u32, y: u32)
        -> impl Future<Output = Result<RgbaImage>> + Send;
}

/// Slippy-map tile fetcher over HTTP.
#[derive(Clone)]
pub struct HttpTileProvider {
    client: Client,
    url_template: String,
}

impl HttpTileProvider {
    /// `url_template` must contain `{z}`, `{x}` and `{y}` placeholders.
    pub fn new(url_template: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url_template: url_template.to_string(),
        })
    }

    fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

impl TileProvider for HttpTileProvider {
    async fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<RgbaImage> {
        let url = self.tile_url(zoom, x, y);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Tile request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Tile server returned status {}", response.status());
        }

        let bytes = response.bytes().await.context("Failed to read tile body")?;
        let decoded = image::load_from_memory(&bytes).context("Failed to decode tile image")?;
        Ok(decoded.to_rgba8())
    }
}

/// Neutral tile substituted when a fetch fails, so one missing tile does
/// not fail the whole render.
pub fn blank_tile() -> RgbaImage {
    RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgba([232, 232, 232, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_substitution() {
        let provider = HttpTileProvider::new("https://tiles.example/{z}/{x}/{y}.png").unwrap();
        assert_eq!(
            provider.tile_url(12, 2148, 1434),
            "https://tiles.example/12/2148/1434.png"
        );
    }

    #[test]
    fn test_blank_tile_dimensions() {
        let tile = blank_tile();
        assert_eq!(tile.dimensions(), (TILE_SIZE, TILE_SIZE));
    }
}
