//! Web Mercator projection and slippy-tile pixel math.

/// Earth radius used by EPSG:3857, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Span of the projected world on each axis, in meters.
pub const WORLD_EXTENT_M: f64 = 2.0 * std::f64::consts::PI * EARTH_RADIUS_M;

/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;

/// Deepest zoom level the renderer will request.
pub const MAX_ZOOM: u8 = 19;

/// Latitude bound of the projection.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Project (lon, lat) degrees to EPSG:3857 meters.
pub fn project(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M
        * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0)
            .tan()
            .ln();
    (x, y)
}

/// Convert EPSG:3857 meters to global pixel coordinates at `zoom`.
///
/// Pixel y grows southward, matching tile row numbering.
pub fn meters_to_pixels(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let world_px = (TILE_SIZE as u64 * (1u64 << zoom)) as f64;
    let px = (x / WORLD_EXTENT_M + 0.5) * world_px;
    let py = (0.5 - y / WORLD_EXTENT_M) * world_px;
    (px, py)
}

/// A projected extent with helpers for margin expansion and zoom fitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Bounding extent of a set of projected points.
    pub fn of_points(points: &[(f64, f64)]) -> Option<Self> {
        let (&(first_x, first_y), rest) = points.split_first()?;
        let mut extent = Self {
            min_x: first_x,
            min_y: first_y,
            max_x: first_x,
            max_y: first_y,
        };
        for &(x, y) in rest {
            extent.min_x = extent.min_x.min(x);
            extent.min_y = extent.min_y.min(y);
            extent.max_x = extent.max_x.max(x);
            extent.max_y = extent.max_y.max(y);
        }
        Some(extent)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Expand by `fraction` of the span on each axis. Degenerate axes are
    /// widened to `min_span` first so a single point still yields a usable
    /// extent.
    pub fn padded(mut self, fraction: f64, min_span: f64) -> Self {
        if self.width() < min_span {
            let center = (self.min_x + self.max_x) / 2.0;
            self.min_x = center - min_span / 2.0;
            self.max_x = center + min_span / 2.0;
        }
        if self.height() < min_span {
            let center = (self.min_y + self.max_y) / 2.0;
            self.min_y = center - min_span / 2.0;
            self.max_y = center + min_span / 2.0;
        }

        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        Self {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    /// Deepest zoom at which the extent fits within `max_px` pixels per axis.
    pub fn fit_zoom(&self, max_px: u32) -> u8 {
        for zoom in (0..=MAX_ZOOM).rev() {
            let world_px = (TILE_SIZE as u64 * (1u64 << zoom)) as f64;
            let w = self.width() / WORLD_EXTENT_M * world_px;
            let h = self.height() / WORLD_EXTENT_M * world_px;
            if w <= max_px as f64 && h <= max_px as f64 {
                return zoom;
            }
        }
        0
    }
}
