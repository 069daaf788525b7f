//! Boundary string parsing.
//!
//! Source CSVs carry polygon vertices as `[x1,y1],[x2,y2],...` text.
//! Malformed tokens are common in that data, so the scanner resynchronizes
//! on bad tokens instead of rejecting the whole row.

use geo::{Coord, LineString, Polygon};

/// Parse a raw boundary string into a polygon.
///
/// Brackets are stripped and the remaining comma-separated tokens are
/// scanned pairwise: two consecutive tokens that parse as floats become an
/// (x, y) vertex and the scan advances by two; otherwise it advances by one
/// and retries. Returns `None` for missing input or fewer than 3 vertices.
pub fn parse_boundary(raw: Option<&str>) -> Option<Polygon<f64>> {
    let raw = raw?;
    let cleaned: String = raw.chars().filter(|c| *c != '[' && *c != ']').collect();
    let tokens: Vec<&str> = cleaned.split(',').collect();

    let mut coords: Vec<Coord<f64>> = Vec::new();
    let mut i = 0;
    while i + 1 < tokens.len() {
        match (
            tokens[i].trim().parse::<f64>(),
            tokens[i + 1].trim().parse::<f64>(),
        ) {
            (Ok(x), Ok(y)) => {
                coords.push(Coord { x, y });
                i += 2;
            }
            _ => i += 1,
        }
    }

    if coords.len() < 3 {
        return None;
    }

    // Polygon::new closes the exterior ring if needed
    Some(Polygon::new(LineString::new(coords), vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_square() {
        let poly = parse_boundary(Some("[1.0,1.0],[1.0,2.0],[2.0,2.0],[2.0,1.0]")).unwrap();
        // Ring is closed by the constructor: 4 vertices + repeated first
        assert_eq!(poly.exterior().coords().count(), 5);
    }

    #[test]
    fn test_skips_garbage_tokens() {
        let poly = parse_boundary(Some("[1,2],xx,[3,4],[5,6]")).unwrap();
        let coords: Vec<(f64, f64)> = poly
            .exterior()
            .coords()
            .map(|c| (c.x, c.y))
            .collect();
        assert_eq!(
            coords,
            vec![(1.0, 2.0), (3.0, 4.0), (5.0, 6.0), (1.0, 2.0)]
        );
    }

    #[test]
    fn test_too_few_pairs() {
        assert!(parse_boundary(Some("[1.0,1.0],[2.0,2.0]")).is_none());
    }

    #[test]
    fn test_missing_input() {
        assert!(parse_boundary(None).is_none());
    }

    #[test]
    fn test_all_garbage() {
        assert!(parse_boundary(Some("not,a,polygon,at,all")).is_none());
        assert!(parse_boundary(Some("")).is_none());
    }

    #[test]
    fn test_resync_on_half_pair() {
        // "3" pairs with "4" after the scanner skips "oops"
        let poly = parse_boundary(Some("[1,2],oops,3,[4,5],[6,7]")).unwrap();
        let first: Vec<(f64, f64)> = poly
            .exterior()
            .coords()
            .take(2)
            .map(|c| (c.x, c.y))
            .collect();
        assert_eq!(first, vec![(1.0, 2.0), (3.0, 4.0)]);
    }
}
