//! Address extraction from feature tags.

use serde::{Deserialize, Serialize};

use super::feature::FeatureRecord;

/// Placeholder for features with no address-bearing tags at all.
pub const UNNAMED_LOCATION: &str = "Unnamed Location";

/// Normalized address components pulled from a feature's tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFields {
    pub address: String,
    pub postcode: String,
    pub city: String,
}

/// Apply the address priority rule to a feature's tags.
///
/// House number + street wins, then `name`, `shop`, `amenity`, then the
/// literal "Unnamed Location". Missing components read as empty strings so
/// the JSON output never carries nulls.
pub fn extract_address_fields(feature: &FeatureRecord) -> AddressFields {
    let house = feature.tag("addr:housenumber");
    let street = feature.tag("addr:street");
    let combined = format!("{} {}", house, street).trim().to_string();

    let address = if !combined.is_empty() {
        combined
    } else if !feature.tag("name").is_empty() {
        feature.tag("name").to_string()
    } else if !feature.tag("shop").is_empty() {
        feature.tag("shop").to_string()
    } else if !feature.tag("amenity").is_empty() {
        feature.tag("amenity").to_string()
    } else {
        UNNAMED_LOCATION.to_string()
    };

    AddressFields {
        address,
        postcode: feature.tag("addr:postcode").to_string(),
        city: feature.tag("addr:city").to_string(),
    }
}

/// One reverse-geocoded output record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRecord {
    pub lat: f64,
    pub lon: f64,
    pub address: String,
    pub postcode: String,
    pub city: String,
    /// Identifier of the source CSV row.
    pub d: String,
}

impl AddressRecord {
    /// Build a record from a feature's anchor coordinates and tags.
    ///
    /// `None` when the feature has no resolvable anchor (an empty area).
    pub fn from_feature(feature: &FeatureRecord, row_id: &str) -> Option<Self> {
        let anchor = feature.anchor()?;
        let fields = extract_address_fields(feature);
        Some(Self {
            lat: anchor.lat,
            lon: anchor.lon,
            address: fields.address,
            postcode: fields.postcode,
            city: fields.city,
            d: row_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureGeometry, OsmType};
    use geo::Point;
    use std::collections::HashMap;

    fn feature_with_tags(tags: &[(&str, &str)]) -> FeatureRecord {
        FeatureRecord {
            osm_type: OsmType::Node,
            osm_id: 1,
            geometry: FeatureGeometry::Point(Point::new(8.5, 47.4)),
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_housenumber_street_wins() {
        let feature = feature_with_tags(&[
            ("addr:housenumber", "12"),
            ("addr:street", "Main St"),
            ("name", "Corner Cafe"),
            ("shop", "bakery"),
            ("amenity", "cafe"),
        ]);
        let fields = extract_address_fields(&feature);
        assert_eq!(fields.address, "12 Main St");
    }

    #[test]
    fn test_street_without_housenumber() {
        let feature = feature_with_tags(&[("addr:street", "Main St")]);
        assert_eq!(extract_address_fields(&feature).address, "Main St");
    }

    #[test]
    fn test_amenity_fallback() {
        let feature = feature_with_tags(&[("amenity", "fountain")]);
        assert_eq!(extract_address_fields(&feature).address, "fountain");
    }

    #[test]
    fn test_unnamed_location() {
        let feature = feature_with_tags(&[("building", "yes")]);
        let fields = extract_address_fields(&feature);
        assert_eq!(fields.address, UNNAMED_LOCATION);
        assert_eq!(fields.postcode, "");
        assert_eq!(fields.city, "");
    }

    #[test]
    fn test_record_carries_row_id() {
        let feature = feature_with_tags(&[("name", "Depot"), ("addr:postcode", "8004")]);
        let record = AddressRecord::from_feature(&feature, "42").unwrap();
        assert_eq!(record.d, "42");
        assert_eq!(record.postcode, "8004");
        assert_eq!(record.lat, 47.4);
        assert_eq!(record.lon, 8.5);
    }
}
