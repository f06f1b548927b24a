use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;

use civitas_common::{ZoneFeature, ZoneTier};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

/// GeoJSON FeatureCollection carrying one classified polygon per locality.
#[derive(Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub properties: FeatureProperties,
    pub geometry: FeatureGeometry,
}

#[derive(Serialize)]
pub struct FeatureProperties {
    pub name: String,
    pub zone: ZoneTier,
    pub complaints: u64,
}

#[derive(Serialize)]
pub struct FeatureGeometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

fn to_feature(zone: ZoneFeature) -> Feature {
    Feature {
        kind: "Feature",
        properties: FeatureProperties {
            name: zone.name,
            zone: zone.zone,
            complaints: zone.complaint_count,
        },
        geometry: FeatureGeometry {
            kind: "Polygon",
            coordinates: vec![zone.geometry.into()],
        },
    }
}

pub async fn zone_map(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> ApiResult<Json<FeatureCollection>> {
    let features = state.zones.zone_map().await?;
    Ok(Json(FeatureCollection {
        kind: "FeatureCollection",
        features: features.into_iter().map(to_feature).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use civitas_common::{GeoPoint, GeoPolygon};

    #[test]
    fn feature_serializes_as_geojson() {
        let feature = to_feature(ZoneFeature {
            name: "Indiranagar".to_string(),
            zone: ZoneTier::Orange,
            complaint_count: 17,
            geometry: GeoPolygon::new(vec![
                GeoPoint::new(12.96, 77.63),
                GeoPoint::new(12.96, 77.65),
                GeoPoint::new(12.98, 77.65),
                GeoPoint::new(12.96, 77.63),
            ]),
        });

        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["properties"]["name"], "Indiranagar");
        assert_eq!(json["properties"]["zone"], "orange");
        assert_eq!(json["properties"]["complaints"], 17);
        assert_eq!(json["geometry"]["type"], "Polygon");
        // Ring coordinates come out in [lng, lat] order.
        assert_eq!(json["geometry"]["coordinates"][0][0][0], 77.63);
        assert_eq!(json["geometry"]["coordinates"][0][0][1], 12.96);
    }
}
