use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use civitas_common::{
    geo, CivitasError, Complaint, ComplaintCategory, DirectoryUser, GeoPoint, GeoPolygon,
    Locality, Result,
};

use crate::rows::{self, db_err, ComplaintRow, COMPLAINT_COLUMNS};
use crate::StoreClient;

/// Recency window applied to neighborhood browsing and city statistics.
const READ_WINDOW_DAYS: i64 = 14;

/// Per-category complaint count for the city dashboard.
#[derive(Debug, Clone)]
pub struct CategoryCount {
    pub category: ComplaintCategory,
    pub count: u64,
}

/// Read-side queries. References (`submitted_by`, `assigned_to`) stay
/// foreign keys; callers resolve them through [`ComplaintReader::user_by_id`]
/// when display names are needed.
#[derive(Clone)]
pub struct ComplaintReader {
    client: StoreClient,
}

impl ComplaintReader {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub async fn complaint_by_id(&self, id: Uuid) -> Result<Option<Complaint>> {
        rows::fetch_complaint(&self.client.pool, id).await
    }

    /// A citizen's own complaints, newest first.
    pub async fn complaints_for_submitter(&self, submitted_by: Uuid) -> Result<Vec<Complaint>> {
        let headers = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints \
             WHERE submitted_by = $1 ORDER BY submitted_at DESC"
        ))
        .bind(submitted_by)
        .fetch_all(&self.client.pool)
        .await
        .map_err(db_err)?;
        rows::assemble(&self.client.pool, headers).await
    }

    /// Every complaint, newest first. Administrator triage view.
    pub async fn all_complaints(&self) -> Result<Vec<Complaint>> {
        let headers = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints ORDER BY submitted_at DESC"
        ))
        .fetch_all(&self.client.pool)
        .await
        .map_err(db_err)?;
        rows::assemble(&self.client.pool, headers).await
    }

    /// Recent complaints within `radius_km` of a point, newest first.
    /// Range prefilter in SQL, exact haversine cut in Rust.
    pub async fn local_complaints(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
    ) -> Result<Vec<Complaint>> {
        if !GeoPoint::new(lat, lng).is_valid() {
            return Err(CivitasError::Validation(
                "latitude and longitude are required".to_string(),
            ));
        }
        let radius_m = radius_km * 1000.0;
        let (min_lat, max_lat, min_lng, max_lng) = geo::degree_bounds(lat, lng, radius_m);
        let cutoff = Utc::now() - Duration::days(READ_WINDOW_DAYS);

        let headers = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints \
             WHERE lat BETWEEN $1 AND $2 AND lng BETWEEN $3 AND $4 \
               AND submitted_at >= $5 \
             ORDER BY submitted_at DESC"
        ))
        .bind(min_lat)
        .bind(max_lat)
        .bind(min_lng)
        .bind(max_lng)
        .bind(cutoff)
        .fetch_all(&self.client.pool)
        .await
        .map_err(db_err)?;

        let nearby = headers
            .into_iter()
            .filter(|r| geo::haversine_m(lat, lng, r.lat, r.lng) <= radius_m)
            .collect();
        rows::assemble(&self.client.pool, nearby).await
    }

    /// Per-category counts over the recency window, descending.
    pub async fn category_stats(&self) -> Result<Vec<CategoryCount>> {
        #[derive(FromRow)]
        struct StatRow {
            category: String,
            count: i64,
        }

        let cutoff = Utc::now() - Duration::days(READ_WINDOW_DAYS);
        let stats = sqlx::query_as::<_, StatRow>(
            "SELECT category, COUNT(*) AS count FROM complaints \
             WHERE submitted_at >= $1 GROUP BY category ORDER BY count DESC",
        )
        .bind(cutoff)
        .fetch_all(&self.client.pool)
        .await
        .map_err(db_err)?;

        stats
            .into_iter()
            .map(|s| {
                Ok(CategoryCount {
                    category: s.category.parse().map_err(CivitasError::Database)?,
                    count: s.count.max(0) as u64,
                })
            })
            .collect()
    }

    /// All locality polygons.
    pub async fn localities(&self) -> Result<Vec<Locality>> {
        #[derive(FromRow)]
        struct LocalityRow {
            id: Uuid,
            name: String,
            geometry: serde_json::Value,
        }

        let rows = sqlx::query_as::<_, LocalityRow>(
            "SELECT id, name, geometry FROM localities ORDER BY name",
        )
        .fetch_all(&self.client.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| {
                let geometry: GeoPolygon = serde_json::from_value(r.geometry).map_err(|e| {
                    CivitasError::Database(format!("corrupt geometry for locality {}: {e}", r.name))
                })?;
                Ok(Locality {
                    id: r.id,
                    name: r.name,
                    geometry,
                })
            })
            .collect()
    }

    /// Locations of every complaint submitted since `cutoff`. Input to the
    /// zone-risk aggregation.
    pub async fn complaint_points_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<GeoPoint>> {
        let points: Vec<(f64, f64)> =
            sqlx::query_as("SELECT lat, lng FROM complaints WHERE submitted_at >= $1")
                .bind(cutoff)
                .fetch_all(&self.client.pool)
                .await
                .map_err(db_err)?;
        Ok(points
            .into_iter()
            .map(|(lat, lng)| GeoPoint::new(lat, lng))
            .collect())
    }

    /// Resolve a directory reference.
    pub async fn user_by_id(&self, id: Uuid) -> Result<Option<DirectoryUser>> {
        #[derive(FromRow)]
        struct UserRow {
            id: Uuid,
            name: String,
            email: String,
            role: String,
        }

        let Some(row) =
            sqlx::query_as::<_, UserRow>("SELECT id, name, email, role FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.client.pool)
                .await
                .map_err(db_err)?
        else {
            return Ok(None);
        };

        Ok(Some(DirectoryUser {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row
                .role
                .parse()
                .map_err(|_| CivitasError::Database(format!("corrupt role for user {}", row.id)))?,
        }))
    }
}
