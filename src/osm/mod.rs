//! External OpenStreetMap service interfaces.
//!
//! The feature service and reverse geocoder sit behind narrow traits so the
//! matching logic is testable with stubs instead of live network calls.

mod nominatim;
mod overpass;
mod tags;

pub use nominatim::{GeocodeError, NominatimClient, DEFAULT_NOMINATIM_URL};
pub use overpass::{OverpassClient, DEFAULT_OVERPASS_URL};
pub use tags::TagFilter;

use std::future::Future;

use anyhow::Result;

use crate::models::{BoundingBox, FeatureRecord};

/// Queries geographic features within a bounding box.
pub trait FeatureService {
    /// Fetch all features inside `bbox` carrying any of the filter's tag keys.
    fn query_features(
        &self,
        bbox: &BoundingBox,
        tags: &TagFilter,
    ) -> impl Future<Output = Result<Vec<FeatureRecord>>> + Send;
}

/// Resolves a human-readable address for a coordinate pair.
pub trait ReverseGeocoder {
    fn reverse_geocode(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Result<String, GeocodeError>> + Send;
}
