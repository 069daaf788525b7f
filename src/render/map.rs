//! Point map rendering onto a basemap.

use std::io::Cursor;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{imageops, ImageFormat, Rgba, RgbaImage};
use tracing::{debug, warn};

use super::mercator::{self, Extent, TILE_SIZE};
use super::tiles::{blank_tile, TileProvider};
use crate::models::GeoPoint;

/// Fraction of the extent added as margin on each axis.
const MARGIN_FRACTION: f64 = 0.1;

/// Minimum extent span in projected meters, so a single point still maps
/// to a well-defined zoom.
const MIN_SPAN_M: f64 = 150.0;

/// Output size bound used when picking the zoom level.
const MAX_OUTPUT_PX: u32 = 1024;

const MARKER_RADIUS: i32 = 6;
const MARKER_COLOR: Rgba<u8> = Rgba([220, 38, 38, 255]);

/// Render `points` over basemap tiles and return the encoded PNG bytes.
///
/// Tiles are fetched sequentially; a failed tile degrades to a blank one.
pub async fn render_point_map_png<P: TileProvider>(
    points: &[GeoPoint],
    provider: &P,
) -> Result<Vec<u8>> {
    let projected: Vec<(f64, f64)> = points
        .iter()
        .map(|p| mercator::project(p.lon, p.lat))
        .collect();
    let extent = Extent::of_points(&projected)
        .context("No points to render")?
        .padded(MARGIN_FRACTION, MIN_SPAN_M);
    let zoom = extent.fit_zoom(MAX_OUTPUT_PX);

    // Extent corners in global pixels; pixel y grows southward
    let (left, bottom) = mercator::meters_to_pixels(extent.min_x, extent.min_y, zoom);
    let (right, top) = mercator::meters_to_pixels(extent.max_x, extent.max_y, zoom);

    let max_tile = (1i64 << zoom) - 1;
    let tile_size = TILE_SIZE as f64;
    let tile_min_x = ((left / tile_size).floor() as i64).clamp(0, max_tile);
    let tile_min_y = ((top / tile_size).floor() as i64).clamp(0, max_tile);
    let tile_max_x = (((right / tile_size).ceil() as i64) - 1).clamp(tile_min_x, max_tile);
    let tile_max_y = (((bottom / tile_size).ceil() as i64) - 1).clamp(tile_min_y, max_tile);

    let cols = (tile_max_x - tile_min_x + 1) as u32;
    let rows = (tile_max_y - tile_min_y + 1) as u32;
    debug!(
        "Rendering {} points at zoom {} over {}x{} tiles",
        points.len(),
        zoom,
        cols,
        rows
    );

    let mut canvas = RgbaImage::new(cols * TILE_SIZE, rows * TILE_SIZE);
    for ty in tile_min_y..=tile_max_y {
        for tx in tile_min_x..=tile_max_x {
            let tile = match provider.fetch_tile(zoom, tx as u32, ty as u32).await {
                Ok(tile) => tile,
                Err(e) => {
                    warn!("Tile {}/{}/{} failed, using blank tile: {:#}", zoom, tx, ty, e);
                    blank_tile()
                }
            };
            imageops::overlay(
                &mut canvas,
                &tile,
                (tx - tile_min_x) * TILE_SIZE as i64,
                (ty - tile_min_y) * TILE_SIZE as i64,
            );
        }
    }

    let origin_x = tile_min_x as f64 * tile_size;
    let origin_y = tile_min_y as f64 * tile_size;
    for &(mx, my) in &projected {
        let (px, py) = mercator::meters_to_pixels(mx, my, zoom);
        draw_marker(
            &mut canvas,
            (px - origin_x).round() as i32,
            (py - origin_y).round() as i32,
        );
    }

    // Crop the tile mosaic down to the padded extent
    let crop_x = (left - origin_x).floor().max(0.0) as u32;
    let crop_y = (top - origin_y).floor().max(0.0) as u32;
    let crop_w = ((right - left).ceil() as u32)
        .max(1)
        .min(canvas.width().saturating_sub(crop_x).max(1));
    let crop_h = ((bottom - top).ceil() as u32)
        .max(1)
        .min(canvas.height().saturating_sub(crop_y).max(1));
    let cropped = imageops::crop_imm(&canvas, crop_x, crop_y, crop_w, crop_h).to_image();

    let mut buf = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(buf)
}

/// Render `points` and return the PNG as a base64 string.
pub async fn render_point_map<P: TileProvider>(points: &[GeoPoint], provider: &P) -> Result<String> {
    let png = render_point_map_png(points, provider).await?;
    Ok(BASE64.encode(&png))
}

fn draw_marker(canvas: &mut RgbaImage, cx: i32, cy: i32) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    for dy in -MARKER_RADIUS..=MARKER_RADIUS {
        for dx in -MARKER_RADIUS..=MARKER_RADIUS {
            if dx * dx + dy * dy > MARKER_RADIUS * MARKER_RADIUS {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && x < w && y >= 0 && y < h {
                canvas.put_pixel(x as u32, y as u32, MARKER_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SolidTiles;

    impl TileProvider for SolidTiles {
        async fn fetch_tile(&self, _zoom: u8, _x: u32, _y: u32) -> Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(
                TILE_SIZE,
                TILE_SIZE,
                Rgba([200, 210, 220, 255]),
            ))
        }
    }

    struct FailingTiles;

    impl TileProvider for FailingTiles {
        async fn fetch_tile(&self, _zoom: u8, _x: u32, _y: u32) -> Result<RgbaImage> {
            anyhow::bail!("tile server down")
        }
    }

    #[tokio::test]
    async fn test_render_two_points() {
        let points = [
            GeoPoint {
                lat: 47.37,
                lon: 8.54,
            },
            GeoPoint {
                lat: 47.38,
                lon: 8.55,
            },
        ];
        let encoded = render_point_map(&points, &SolidTiles).await.unwrap();
        // Base64 of the PNG signature
        assert!(encoded.starts_with("iVBOR"));
    }

    #[tokio::test]
    async fn test_render_single_point() {
        let points = [GeoPoint {
            lat: 47.37,
            lon: 8.54,
        }];
        let png = render_point_map_png(&points, &SolidTiles).await.unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_render_survives_tile_failures() {
        let points = [GeoPoint {
            lat: 47.37,
            lon: 8.54,
        }];
        let encoded = render_point_map(&points, &FailingTiles).await.unwrap();
        assert!(!encoded.is_empty());
    }

    #[tokio::test]
    async fn test_render_no_points_is_error() {
        assert!(render_point_map(&[], &SolidTiles).await.is_err());
    }
}
