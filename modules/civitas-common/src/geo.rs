use serde::{Deserialize, Serialize};

/// A geographic point in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Valid WGS84 coordinates, finite and in range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A single simple (non-self-intersecting) polygon in geographic
/// coordinates. Serialized as a GeoJSON-style ring of `[lng, lat]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<[f64; 2]>", from = "Vec<[f64; 2]>")]
pub struct GeoPolygon {
    pub ring: Vec<GeoPoint>,
}

impl GeoPolygon {
    pub fn new(ring: Vec<GeoPoint>) -> Self {
        Self { ring }
    }

    /// Ray-casting point-in-polygon test (even-odd rule). Works whether or
    /// not the ring repeats its first vertex at the end.
    pub fn contains(&self, p: &GeoPoint) -> bool {
        let ring = &self.ring;
        let n = ring.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = (ring[i].lng, ring[i].lat);
            let (xj, yj) = (ring[j].lng, ring[j].lat);
            let crosses = (yi > p.lat) != (yj > p.lat)
                && p.lng < (xj - xi) * (p.lat - yi) / (yj - yi) + xi;
            if crosses {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

impl From<GeoPolygon> for Vec<[f64; 2]> {
    fn from(poly: GeoPolygon) -> Self {
        poly.ring.iter().map(|p| [p.lng, p.lat]).collect()
    }
}

impl From<Vec<[f64; 2]>> for GeoPolygon {
    fn from(coords: Vec<[f64; 2]>) -> Self {
        GeoPolygon {
            ring: coords
                .into_iter()
                .map(|[lng, lat]| GeoPoint { lat, lng })
                .collect(),
        }
    }
}

/// Haversine great-circle distance between two lat/lng points in meters.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_M * c
}

/// Geohash precision used for the complaint bucketing column. Precision-6
/// cells are ~1.2 km x 0.6 km, so a cell plus its eight neighbors always
/// covers the matcher's 200 m search radius.
pub const BUCKET_PRECISION: usize = 6;

/// Geohash bucket for a point, used as the stored prefilter key.
pub fn bucket(lat: f64, lng: f64) -> Option<String> {
    geohash::encode(geohash::Coord { x: lng, y: lat }, BUCKET_PRECISION).ok()
}

/// The bucket containing a point plus its eight neighbors. Candidate
/// queries restrict to these cells before exact distance filtering.
pub fn bucket_cells(lat: f64, lng: f64) -> Vec<String> {
    let Some(center) = bucket(lat, lng) else {
        return Vec::new();
    };
    let mut cells = vec![center.clone()];
    if let Ok(n) = geohash::neighbors(&center) {
        cells.extend([n.sw, n.s, n.se, n.w, n.e, n.nw, n.n, n.ne]);
    }
    cells
}

/// Latitude/longitude bounds of a circle, for SQL range prefilters.
/// Returns (min_lat, max_lat, min_lng, max_lng).
pub fn degree_bounds(lat: f64, lng: f64, radius_m: f64) -> (f64, f64, f64, f64) {
    const METERS_PER_DEGREE_LAT: f64 = 111_320.0;
    let d_lat = radius_m / METERS_PER_DEGREE_LAT;
    let cos_lat = lat.to_radians().cos().max(0.01);
    let d_lng = radius_m / (METERS_PER_DEGREE_LAT * cos_lat);
    (lat - d_lat, lat + d_lat, lng - d_lng, lng + d_lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> GeoPolygon {
        // Unit square around the origin, closed ring.
        GeoPolygon::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(0.0, 0.0),
        ])
    }

    #[test]
    fn haversine_zero_distance() {
        assert_eq!(haversine_m(12.9716, 77.5946, 12.9716, 77.5946), 0.0);
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn haversine_short_east_west_hop() {
        // ~0.0018 degrees of longitude at Bengaluru's latitude is ~195 m.
        let d = haversine_m(12.9716, 77.5946, 12.9716, 77.5964);
        assert!((180.0..210.0).contains(&d), "got {d}");
    }

    #[test]
    fn point_inside_square() {
        assert!(square().contains(&GeoPoint::new(0.5, 0.5)));
    }

    #[test]
    fn point_outside_square() {
        assert!(!square().contains(&GeoPoint::new(1.5, 0.5)));
        assert!(!square().contains(&GeoPoint::new(0.5, -0.5)));
    }

    #[test]
    fn unclosed_ring_still_works() {
        let open = GeoPolygon::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
        ]);
        assert!(open.contains(&GeoPoint::new(0.5, 0.5)));
        assert!(!open.contains(&GeoPoint::new(2.0, 2.0)));
    }

    #[test]
    fn degenerate_ring_contains_nothing() {
        let line = GeoPolygon::new(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)]);
        assert!(!line.contains(&GeoPoint::new(0.5, 0.5)));
    }

    #[test]
    fn polygon_ring_serde_round_trip() {
        let poly = square();
        let json = serde_json::to_string(&poly).unwrap();
        assert!(json.starts_with("[["), "ring form expected, got {json}");
        let back: GeoPolygon = serde_json::from_str(&json).unwrap();
        assert_eq!(back, poly);
    }

    #[test]
    fn bucket_cells_cover_neighborhood() {
        let cells = bucket_cells(12.9716, 77.5946);
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], bucket(12.9716, 77.5946).unwrap());
        for c in &cells {
            assert_eq!(c.len(), BUCKET_PRECISION);
        }
    }

    #[test]
    fn coordinate_validity() {
        assert!(GeoPoint::new(12.9716, 77.5946).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }
}
