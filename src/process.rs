//! Batch reverse-geocoding pipeline over CSV rows.

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::boundary::parse_boundary;
use crate::matcher::FeatureMatcher;
use crate::models::AddressRecord;
use crate::osm::FeatureService;
use crate::rows::BoundaryRow;

/// Warning attached to an empty result set.
pub const EMPTY_RESULT_WARNING: &str =
    "No addresses found; check your boundaries or increase --buffer.";

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub records: Vec<AddressRecord>,
    /// Rows whose boundary parsed into a polygon.
    pub polygons: usize,
    /// Rows skipped for an unparseable boundary or a failed service call.
    pub skipped: usize,
}

/// JSON envelope printed by the bulk CLI.
#[derive(Debug, Serialize)]
pub struct BatchOutput {
    pub data: Vec<AddressRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl BatchOutput {
    pub fn from_summary(summary: BatchSummary) -> Self {
        let warning = summary
            .records
            .is_empty()
            .then(|| EMPTY_RESULT_WARNING.to_string());
        Self {
            data: summary.records,
            warning,
        }
    }
}

/// Run the parse → match → extract pipeline over a set of rows.
///
/// Malformed boundaries and failed service calls skip their row; the batch
/// always runs to completion.
pub async fn extract_addresses<S: FeatureService>(
    rows: &[BoundaryRow],
    matcher: &FeatureMatcher<S>,
    progress: Option<&ProgressBar>,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for row in rows {
        let polygon = match parse_boundary(row.boundary.as_deref()) {
            Some(polygon) => polygon,
            None => {
                debug!("Row '{}': unparseable boundary, skipping", row.number);
                summary.skipped += 1;
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                continue;
            }
        };
        summary.polygons += 1;

        match matcher.match_polygon(&polygon, &row.number).await {
            Ok(records) => summary.records.extend(records),
            Err(e) => {
                warn!("Feature query failed for row '{}': {:#}", row.number, e);
                summary.skipped += 1;
            }
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    if summary.polygons == 0 {
        warn!("No valid polygons after parsing.");
    }
    info!(
        "Processed {} polygons, found {} addresses",
        summary.polygons,
        summary.records.len()
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::DEFAULT_BUFFER_DEGREES;
    use crate::models::{BoundingBox, FeatureGeometry, FeatureRecord, OsmType};
    use crate::osm::TagFilter;
    use anyhow::Result;
    use geo::Point;
    use std::collections::HashMap;

    #[derive(Clone)]
    struct StubService {
        features: Vec<FeatureRecord>,
        fail: bool,
    }

    impl FeatureService for StubService {
        async fn query_features(
            &self,
            _bbox: &BoundingBox,
            _tags: &TagFilter,
        ) -> Result<Vec<FeatureRecord>> {
            if self.fail {
                anyhow::bail!("feature service unavailable");
            }
            Ok(self.features.clone())
        }
    }

    fn row(boundary: Option<&str>, number: &str) -> BoundaryRow {
        BoundaryRow {
            boundary: boundary.map(str::to_string),
            number: number.to_string(),
        }
    }

    fn main_st_feature() -> FeatureRecord {
        FeatureRecord {
            osm_type: OsmType::Node,
            osm_id: 1,
            geometry: FeatureGeometry::Point(Point::new(1.5, 1.5)),
            tags: [("addr:housenumber", "12"), ("addr:street", "Main St")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_single_row() {
        let matcher = FeatureMatcher::new(
            StubService {
                features: vec![main_st_feature()],
                fail: false,
            },
            DEFAULT_BUFFER_DEGREES,
            TagFilter::addresses(),
        );
        let rows = vec![row(Some("[1.0,1.0],[1.0,2.0],[2.0,2.0],[2.0,1.0]"), "3")];

        let summary = extract_addresses(&rows, &matcher, None).await;

        assert_eq!(summary.polygons, 1);
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.records[0].address, "12 Main St");
        assert_eq!(summary.records[0].d, "3");

        let output = BatchOutput::from_summary(summary);
        assert!(output.warning.is_none());
    }

    #[tokio::test]
    async fn test_bad_rows_skipped_batch_continues() {
        let matcher = FeatureMatcher::new(
            StubService {
                features: vec![main_st_feature()],
                fail: false,
            },
            DEFAULT_BUFFER_DEGREES,
            TagFilter::addresses(),
        );
        let rows = vec![
            row(None, "1"),
            row(Some("[1,2],xx"), "2"),
            row(Some("[1.0,1.0],[1.0,2.0],[2.0,2.0],[2.0,1.0]"), "3"),
        ];

        let summary = extract_addresses(&rows, &matcher, None).await;

        assert_eq!(summary.polygons, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.records.len(), 1);
    }

    #[tokio::test]
    async fn test_service_failure_skips_row() {
        let matcher = FeatureMatcher::new(
            StubService {
                features: vec![],
                fail: true,
            },
            DEFAULT_BUFFER_DEGREES,
            TagFilter::addresses(),
        );
        let rows = vec![row(Some("[1.0,1.0],[1.0,2.0],[2.0,2.0],[2.0,1.0]"), "1")];

        let summary = extract_addresses(&rows, &matcher, None).await;

        assert_eq!(summary.skipped, 1);
        assert!(summary.records.is_empty());

        let output = BatchOutput::from_summary(summary);
        assert_eq!(output.warning.as_deref(), Some(EMPTY_RESULT_WARNING));
    }

    #[test]
    fn test_output_serialization_omits_empty_warning() {
        let output = BatchOutput {
            data: vec![],
            warning: None,
        };
        let json = serde_json::to_string(&output).unwrap();
        assert_eq!(json, r#"{"data":[]}"#);
    }
}
