//! Point map rendering over basemap tiles.

pub mod map;
pub mod mercator;
pub mod tiles;

pub use map::{render_point_map, render_point_map_png};
pub use tiles::{HttpTileProvider, TileProvider, DEFAULT_TILE_URL};
