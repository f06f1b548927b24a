use chrono::{Duration, Utc};
use tracing::info;

use civitas_common::{GeoPoint, GeoPolygon, Result, ZoneFeature, ZoneTier};

use crate::ComplaintReader;

/// Recency window for zone classification.
const ZONE_WINDOW_DAYS: i64 = 14;

/// Classification thresholds, strictly-greater-than on both boundaries:
/// a count of exactly `red_above` is orange, exactly `elevated_above` is
/// green.
#[derive(Debug, Clone, Copy)]
pub struct ZoneThresholds {
    pub red_above: u32,
    pub elevated_above: u32,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            red_above: 30,
            elevated_above: 10,
        }
    }
}

/// Classify a locality's complaint count into a traffic-light tier.
pub fn classify(count: u64, thresholds: &ZoneThresholds) -> ZoneTier {
    if count > u64::from(thresholds.red_above) {
        ZoneTier::Red
    } else if count > u64::from(thresholds.elevated_above) {
        ZoneTier::Orange
    } else {
        ZoneTier::Green
    }
}

/// Number of points falling inside a polygon.
pub fn count_within(points: &[GeoPoint], polygon: &GeoPolygon) -> u64 {
    points.iter().filter(|p| polygon.contains(p)).count() as u64
}

/// Buckets each locality's recent complaint density into risk tiers for
/// the choropleth map. Read-only; loads the window's complaint points
/// once and tests them against every locality polygon.
#[derive(Clone)]
pub struct ZoneAggregator {
    reader: ComplaintReader,
    thresholds: ZoneThresholds,
}

impl ZoneAggregator {
    pub fn new(reader: ComplaintReader, thresholds: ZoneThresholds) -> Self {
        Self { reader, thresholds }
    }

    /// One classified feature per locality. An empty locality set yields
    /// an empty collection.
    pub async fn zone_map(&self) -> Result<Vec<ZoneFeature>> {
        let localities = self.reader.localities().await?;
        if localities.is_empty() {
            return Ok(Vec::new());
        }

        let cutoff = Utc::now() - Duration::days(ZONE_WINDOW_DAYS);
        let points = self.reader.complaint_points_since(cutoff).await?;

        let features: Vec<ZoneFeature> = localities
            .into_iter()
            .map(|locality| {
                let complaint_count = count_within(&points, &locality.geometry);
                ZoneFeature {
                    name: locality.name,
                    zone: classify(complaint_count, &self.thresholds),
                    complaint_count,
                    geometry: locality.geometry,
                }
            })
            .collect();

        info!(
            localities = features.len(),
            points = points.len(),
            "Zone risk map computed"
        );
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> GeoPolygon {
        GeoPolygon::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(0.0, 0.0),
        ])
    }

    #[test]
    fn boundary_counts_classify_correctly() {
        let t = ZoneThresholds::default();
        assert_eq!(classify(0, &t), ZoneTier::Green);
        assert_eq!(classify(10, &t), ZoneTier::Green);
        assert_eq!(classify(11, &t), ZoneTier::Orange);
        assert_eq!(classify(30, &t), ZoneTier::Orange);
        assert_eq!(classify(31, &t), ZoneTier::Red);
    }

    #[test]
    fn custom_thresholds_keep_strict_boundaries() {
        let t = ZoneThresholds {
            red_above: 5,
            elevated_above: 2,
        };
        assert_eq!(classify(2, &t), ZoneTier::Green);
        assert_eq!(classify(3, &t), ZoneTier::Orange);
        assert_eq!(classify(5, &t), ZoneTier::Orange);
        assert_eq!(classify(6, &t), ZoneTier::Red);
    }

    #[test]
    fn count_within_square() {
        let points = vec![
            GeoPoint::new(0.5, 0.5),
            GeoPoint::new(0.25, 0.75),
            GeoPoint::new(1.5, 0.5),
            GeoPoint::new(-0.5, 0.5),
        ];
        assert_eq!(count_within(&points, &square()), 2);
    }

    #[test]
    fn count_within_no_points() {
        assert_eq!(count_within(&[], &square()), 0);
    }
}
