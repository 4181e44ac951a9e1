//! Well-known-text geometry parsing. Only `POINT` and the outer ring of a
//! `POLYGON` are understood; anything else is treated as absent geometry.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::GeoPoint;

static POINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*POINT\s*\(\s*([+-]?\d+(?:\.\d+)?)\s+([+-]?\d+(?:\.\d+)?)\s*\)\s*$").unwrap()
});
static POLYGON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*POLYGON\s*\(\s*\(([^()]*)\)").unwrap());

/// Parse `POINT (<lon> <lat>)`. Longitude comes first.
pub fn parse_wkt_point(wkt: &str) -> Option<GeoPoint> {
    let caps = POINT_RE.captures(wkt)?;
    let lng: f64 = caps[1].parse().ok()?;
    let lat: f64 = caps[2].parse().ok()?;
    in_range(lat, lng).then_some(GeoPoint { lat, lng })
}

/// Parse the outer ring of `POLYGON ((lon lat, lon lat, ...))`.
/// A single malformed vertex rejects the whole polygon.
pub fn parse_wkt_polygon(wkt: &str) -> Option<Vec<GeoPoint>> {
    let caps = POLYGON_RE.captures(wkt)?;
    let ring: Option<Vec<GeoPoint>> = caps[1]
        .split(',')
        .map(|pair| {
            let mut parts = pair.split_whitespace();
            let lng: f64 = parts.next()?.parse().ok()?;
            let lat: f64 = parts.next()?.parse().ok()?;
            if parts.next().is_some() || !in_range(lat, lng) {
                return None;
            }
            Some(GeoPoint { lat, lng })
        })
        .collect();
    ring.filter(|r| !r.is_empty())
}

/// Vertex mean of a ring, ignoring the closing vertex when it repeats the first.
pub fn polygon_centroid(ring: &[GeoPoint]) -> Option<GeoPoint> {
    let vertices = match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    };
    if vertices.is_empty() {
        return None;
    }
    let n = vertices.len() as f64;
    let (lat_sum, lng_sum) = vertices
        .iter()
        .fold((0.0, 0.0), |(la, ln), p| (la + p.lat, ln + p.lng));
    Some(GeoPoint {
        lat: lat_sum / n,
        lng: lng_sum / n,
    })
}

/// Point geometry, else the centroid of a polygon geometry.
pub fn parse_wkt_location(wkt: &str) -> Option<GeoPoint> {
    parse_wkt_point(wkt).or_else(|| parse_wkt_polygon(wkt).and_then(|r| polygon_centroid(&r)))
}

fn in_range(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_is_lon_then_lat() {
        let p = parse_wkt_point("POINT (-3.17 51.46)").unwrap();
        assert_eq!(p.lng, -3.17);
        assert_eq!(p.lat, 51.46);
    }

    #[test]
    fn garbage_is_not_a_point() {
        assert_eq!(parse_wkt_point("not a point"), None);
        assert_eq!(parse_wkt_point(""), None);
        assert_eq!(parse_wkt_point("POINT (1.0)"), None);
        assert_eq!(parse_wkt_point("POINT (a b)"), None);
    }

    #[test]
    fn point_tolerates_inner_whitespace_and_case() {
        let p = parse_wkt_point("point(  2   48.5 )").unwrap();
        assert_eq!((p.lng, p.lat), (2.0, 48.5));
    }

    #[test]
    fn trailing_content_is_rejected() {
        assert_eq!(parse_wkt_point("POINT (1 2) extra"), None);
    }

    #[test]
    fn out_of_range_point_is_rejected() {
        assert_eq!(parse_wkt_point("POINT (10 95)"), None);
        assert_eq!(parse_wkt_point("POINT (181 10)"), None);
    }

    #[test]
    fn polygon_outer_ring_parses() {
        let ring = parse_wkt_polygon("POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0))").unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[1], GeoPoint { lat: 0.0, lng: 2.0 });
    }

    #[test]
    fn polygon_with_bad_vertex_is_rejected() {
        assert_eq!(parse_wkt_polygon("POLYGON ((0 0, x 1, 2 2))"), None);
        assert_eq!(parse_wkt_polygon("POLYGON (())"), None);
    }

    #[test]
    fn centroid_skips_closing_vertex() {
        let ring = parse_wkt_polygon("POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0))").unwrap();
        assert_eq!(polygon_centroid(&ring), Some(GeoPoint { lat: 1.0, lng: 1.0 }));
        assert_eq!(polygon_centroid(&[]), None);
    }

    #[test]
    fn location_prefers_point_then_polygon() {
        assert_eq!(
            parse_wkt_location("POINT (1 2)"),
            Some(GeoPoint { lat: 2.0, lng: 1.0 })
        );
        assert_eq!(
            parse_wkt_location("POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))"),
            Some(GeoPoint { lat: 2.0, lng: 2.0 })
        );
        assert_eq!(parse_wkt_location("LINESTRING (0 0, 1 1)"), None);
    }
}
