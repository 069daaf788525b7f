//! Overpass API client for bounding-box feature queries.

use anyhow::{Context, Result};
use geo::{Coord, LineString, Point, Polygon};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use super::{FeatureService, TagFilter};
use crate::models::{BoundingBox, FeatureGeometry, FeatureRecord, OsmType};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

const USER_AGENT: &str = "Rowan/0.1 (boundary reverse geocoder)";
const REQUEST_TIMEOUT_SECS: u64 = 25;

/// Feature service backed by the Overpass HTTP API.
#[derive(Clone)]
pub struct OverpassClient {
    client: Client,
    endpoint: Url,
}

impl OverpassClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).context("Invalid Overpass endpoint URL")?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, endpoint })
    }
}

impl FeatureService for OverpassClient {
    async fn query_features(
        &self,
        bbox: &BoundingBox,
        tags: &TagFilter,
    ) -> Result<Vec<FeatureRecord>> {
        let query = build_query(bbox, tags);
        debug!("Overpass query:\n{}", query);

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[("data", query.as_str())])
            .send()
            .await
            .context("Overpass request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Overpass returned status {}", response.status());
        }

        let body: OverpassResponse = response
            .json()
            .await
            .context("Failed to parse Overpass response")?;

        Ok(convert_elements(body))
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    geometry: Option<Vec<OverpassVertex>>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassVertex {
    lat: f64,
    lon: f64,
}

/// Build an Overpass QL union query over the filter's tag keys.
///
/// Overpass bbox clauses are (south, west, north, east). `out geom` makes
/// ways carry their full vertex list so area containment can be tested.
fn build_query(bbox: &BoundingBox, tags: &TagFilter) -> String {
    let bbox_clause = format!(
        "({},{},{},{})",
        bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon
    );

    let mut query = String::from("[out:json][timeout:25];\n(\n");
    for key in tags.keys() {
        query.push_str(&format!("  nwr[\"{}\"]{};\n", key, bbox_clause));
    }
    query.push_str(");\nout tags geom;\n");
    query
}

/// Convert Overpass elements into feature records.
///
/// Nodes become point features, ways with a closed ring become area
/// features. Open ways and relations are skipped.
fn convert_elements(response: OverpassResponse) -> Vec<FeatureRecord> {
    let mut features = Vec::new();

    for element in response.elements {
        let (osm_type, geometry) = match element.kind.as_str() {
            "node" => {
                let (Some(lat), Some(lon)) = (element.lat, element.lon) else {
                    continue;
                };
                (OsmType::Node, FeatureGeometry::Point(Point::new(lon, lat)))
            }
            "way" => match closed_ring(element.geometry.as_deref()) {
                Some(ring) => (OsmType::Way, FeatureGeometry::Area(ring)),
                None => {
                    debug!("Skipping way {} without a closed ring", element.id);
                    continue;
                }
            },
            _ => {
                debug!("Skipping unsupported element {}/{}", element.kind, element.id);
                continue;
            }
        };

        features.push(FeatureRecord {
            osm_type,
            osm_id: element.id,
            geometry,
            tags: element.tags,
        });
    }

    features
}

/// Build a polygon from a way's vertex list when it forms a closed ring.
fn closed_ring(vertices: Option<&[OverpassVertex]>) -> Option<Polygon<f64>> {
    let vertices = vertices?;
    if vertices.len() < 4 {
        return None;
    }

    let coords: Vec<Coord<f64>> = vertices
        .iter()
        .map(|v| Coord { x: v.lon, y: v.lat })
        .collect();

    if coords.first() != coords.last() {
        return None;
    }

    Some(Polygon::new(LineString::new(coords), vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_bbox_order() {
        let bbox = BoundingBox {
            min_lon: 8.5,
            min_lat: 47.3,
            max_lon: 8.6,
            max_lat: 47.4,
        };
        let query = build_query(&bbox, &TagFilter::new(["building"]));
        assert!(query.contains("nwr[\"building\"](47.3,8.5,47.4,8.6);"));
        assert!(query.contains("out tags geom;"));
    }

    #[test]
    fn test_query_one_clause_per_key() {
        let bbox = BoundingBox {
            min_lon: 0.0,
            min_lat: 0.0,
            max_lon: 1.0,
            max_lat: 1.0,
        };
        let query = build_query(&bbox, &TagFilter::addresses());
        assert_eq!(query.matches("nwr[").count(), 8);
        assert!(query.contains("nwr[\"addr:housenumber\"]"));
    }

    #[test]
    fn test_convert_elements() {
        let json = r#"{
            "elements": [
                {"type": "node", "id": 1, "lat": 47.4, "lon": 8.5,
                 "tags": {"addr:housenumber": "12", "addr:street": "Main St"}},
                {"type": "way", "id": 2,
                 "geometry": [
                    {"lat": 47.0, "lon": 8.0}, {"lat": 47.0, "lon": 8.1},
                    {"lat": 47.1, "lon": 8.1}, {"lat": 47.0, "lon": 8.0}
                 ],
                 "tags": {"building": "yes"}},
                {"type": "way", "id": 3,
                 "geometry": [{"lat": 47.0, "lon": 8.0}, {"lat": 47.1, "lon": 8.1}],
                 "tags": {"name": "open path"}},
                {"type": "relation", "id": 4, "tags": {"name": "ignored"}}
            ]
        }"#;
        let response: OverpassResponse = serde_json::from_str(json).unwrap();
        let features = convert_elements(response);

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].osm_type, OsmType::Node);
        assert_eq!(features[0].tag("addr:housenumber"), "12");
        assert_eq!(features[1].osm_type, OsmType::Way);
        assert!(matches!(features[1].geometry, FeatureGeometry::Area(_)));
    }

    #[test]
    fn test_node_without_coordinates_skipped() {
        let json = r#"{"elements": [{"type": "node", "id": 9, "tags": {"name": "x"}}]}"#;
        let response: OverpassResponse = serde_json::from_str(json).unwrap();
        assert!(convert_elements(response).is_empty());
    }
}
