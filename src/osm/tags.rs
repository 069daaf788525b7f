//! Tag key filters for feature queries.

/// Ordered set of OSM tag keys a feature query should match.
#[derive(Debug, Clone)]
pub struct TagFilter {
    keys: Vec<String>,
}

impl TagFilter {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// The address-bearing keys the reverse-geocoding pipeline queries for.
    pub fn addresses() -> Self {
        Self::new([
            "building",
            "addr:housenumber",
            "addr:street",
            "addr:postcode",
            "addr:city",
            "name",
            "shop",
            "amenity",
        ])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for TagFilter {
    fn default() -> Self {
        Self::addresses()
    }
}
