//! Core data models for the reverse-geocoding pipeline.

pub mod address;
pub mod feature;

pub use address::{extract_address_fields, AddressFields, AddressRecord};
pub use feature::{BoundingBox, FeatureGeometry, FeatureRecord, GeoPoint, OsmType};
