//! Feature matching: bounding-box queries filtered by polygon containment.

use anyhow::Result;
use geo::Polygon;
use tracing::{debug, info};

use crate::models::{AddressRecord, BoundingBox, FeatureRecord};
use crate::osm::{FeatureService, TagFilter};

/// Default outward expansion, in degrees, applied to a polygon's bounding
/// box before querying. A tuning heuristic, not a correctness guarantee.
pub const DEFAULT_BUFFER_DEGREES: f64 = 0.0001;

/// Matches features from an external service against boundary polygons.
pub struct FeatureMatcher<S> {
    service: S,
    buffer: f64,
    tags: TagFilter,
}

impl<S: FeatureService> FeatureMatcher<S> {
    pub fn new(service: S, buffer: f64, tags: TagFilter) -> Self {
        Self {
            service,
            buffer,
            tags,
        }
    }

    /// Reverse-geocode one polygon into address records.
    ///
    /// Queries the feature service for the polygon's buffered bounding box,
    /// keeps features strictly inside the original polygon, and falls back
    /// to the buffered region for any group the strict filter empties.
    /// A service failure propagates so the caller can skip the row.
    pub async fn match_polygon(
        &self,
        polygon: &Polygon<f64>,
        row_id: &str,
    ) -> Result<Vec<AddressRecord>> {
        let Some(bbox) = BoundingBox::from_polygon(polygon) else {
            debug!("Row '{}': degenerate polygon, skipping", row_id);
            return Ok(Vec::new());
        };
        let query_box = bbox.expanded(self.buffer);

        let features = self.service.query_features(&query_box, &self.tags).await?;
        if features.is_empty() {
            info!("No features found in bounding box for row '{}'", row_id);
            return Ok(Vec::new());
        }

        let (points, areas): (Vec<FeatureRecord>, Vec<FeatureRecord>) =
            features.into_iter().partition(FeatureRecord::is_point);

        let buffered = query_box.to_polygon();
        let points_in = contained(points, polygon, &buffered);
        let areas_in = contained(areas, polygon, &buffered);

        debug!(
            "Row '{}': {} point and {} area features matched",
            row_id,
            points_in.len(),
            areas_in.len()
        );

        let mut records = Vec::with_capacity(points_in.len() + areas_in.len());
        for feature in points_in.iter().chain(areas_in.iter()) {
            if let Some(record) = AddressRecord::from_feature(feature, row_id) {
                records.push(record);
            }
        }

        Ok(records)
    }
}

/// Strict containment filter with a buffered-region fallback.
///
/// An empty strict filter over a non-empty group retries against the
/// buffered region, recovering features that sit just outside an imprecise
/// boundary.
fn contained(
    group: Vec<FeatureRecord>,
    polygon: &Polygon<f64>,
    buffered: &Polygon<f64>,
) -> Vec<FeatureRecord> {
    if group.is_empty() {
        return group;
    }

    let strict: Vec<FeatureRecord> = group
        .iter()
        .filter(|f| f.within(polygon))
        .cloned()
        .collect();
    if !strict.is_empty() {
        return strict;
    }

    group.into_iter().filter(|f| f.within(buffered)).collect()
}
