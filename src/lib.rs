//! Rowan - boundary reverse-geocoding against OpenStreetMap feature data.
//!
//! This library provides shared types and modules for the server and CLI binaries.

pub mod boundary;
pub mod matcher;
pub mod models;
pub mod osm;
pub mod process;
pub mod render;
pub mod rows;

pub use models::{AddressRecord, BoundingBox, FeatureRecord, GeoPoint, OsmType};
pub use osm::{FeatureService, ReverseGeocoder};
