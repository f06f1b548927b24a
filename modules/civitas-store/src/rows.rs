// Row structs and assembly helpers shared by the reader and writer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use civitas_common::{
    CivitasError, Complaint, ComplaintStatus, Feedback, GeoPoint, ResolutionPhoto, Result,
    UpdateEntry,
};

pub(crate) const COMPLAINT_COLUMNS: &str = "id, category, sub_type, description, address, \
     lat, lng, photo, severity, status, submitted_at, reraised_count, submitted_by, \
     assigned_to, feedback_rating, feedback_comment, feedback_submitted_at";

pub(crate) fn db_err(e: sqlx::Error) -> CivitasError {
    CivitasError::Database(e.to_string())
}

/// A row from the complaints table, before enum parsing and child assembly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ComplaintRow {
    pub id: Uuid,
    pub category: String,
    pub sub_type: String,
    pub description: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub photo: String,
    pub severity: String,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub reraised_count: i32,
    pub submitted_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub feedback_rating: Option<i16>,
    pub feedback_comment: Option<String>,
    pub feedback_submitted_at: Option<DateTime<Utc>>,
}

fn corrupt(field: &str, value: &str) -> CivitasError {
    CivitasError::Database(format!("corrupt {field} value in complaints row: {value}"))
}

impl ComplaintRow {
    pub(crate) fn status(&self) -> Result<ComplaintStatus> {
        self.status.parse().map_err(|_| corrupt("status", &self.status))
    }

    pub(crate) fn into_complaint(
        self,
        updates: Vec<UpdateEntry>,
        supported_by: Vec<Uuid>,
        before_after_photos: Vec<ResolutionPhoto>,
    ) -> Result<Complaint> {
        let status = self.status()?;
        let feedback = match (self.feedback_rating, self.feedback_submitted_at) {
            (Some(rating), Some(submitted_at)) => Some(Feedback {
                rating: rating as u8,
                comment: self.feedback_comment,
                submitted_at,
            }),
            _ => None,
        };
        Ok(Complaint {
            id: self.id,
            category: self
                .category
                .parse()
                .map_err(|_| corrupt("category", &self.category))?,
            sub_type: self.sub_type,
            description: self.description,
            address: self.address,
            location: GeoPoint::new(self.lat, self.lng),
            photo: self.photo,
            severity: self
                .severity
                .parse()
                .map_err(|_| corrupt("severity", &self.severity))?,
            status,
            submitted_at: self.submitted_at,
            reraised_count: self.reraised_count.max(0) as u32,
            submitted_by: self.submitted_by,
            assigned_to: self.assigned_to,
            updates,
            supported_by,
            before_after_photos,
            feedback,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UpdateRow {
    complaint_id: Uuid,
    date: DateTime<Utc>,
    text: String,
    updated_by: Uuid,
}

#[derive(Debug, sqlx::FromRow)]
struct SupporterRow {
    complaint_id: Uuid,
    user_id: Uuid,
}

#[derive(Debug, sqlx::FromRow)]
struct PhotoRow {
    complaint_id: Uuid,
    url: String,
    uploaded_at: DateTime<Utc>,
    uploaded_by: Uuid,
}

/// Lock a complaint header row inside a transaction. Returns `NotFound`
/// when no such complaint exists.
pub(crate) async fn lock_complaint<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<ComplaintRow> {
    sqlx::query_as::<_, ComplaintRow>(&format!(
        "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(db_err)?
    .ok_or_else(|| CivitasError::NotFound("complaint not found".to_string()))
}

/// Fetch one complaint with its child logs assembled.
pub(crate) async fn fetch_complaint(pool: &PgPool, id: Uuid) -> Result<Option<Complaint>> {
    let Some(row) = sqlx::query_as::<_, ComplaintRow>(&format!(
        "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_err)?
    else {
        return Ok(None);
    };

    let mut assembled = assemble(pool, vec![row]).await?;
    Ok(assembled.pop())
}

/// Assemble child logs for a batch of header rows with three grouped
/// queries, preserving the input order.
pub(crate) async fn assemble(pool: &PgPool, rows: Vec<ComplaintRow>) -> Result<Vec<Complaint>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let update_rows = sqlx::query_as::<_, UpdateRow>(
        "SELECT complaint_id, date, text, updated_by FROM complaint_updates \
         WHERE complaint_id = ANY($1) ORDER BY date, id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    let supporter_rows = sqlx::query_as::<_, SupporterRow>(
        "SELECT complaint_id, user_id FROM complaint_supporters \
         WHERE complaint_id = ANY($1) ORDER BY supported_at",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    let photo_rows = sqlx::query_as::<_, PhotoRow>(
        "SELECT complaint_id, url, uploaded_at, uploaded_by FROM complaint_photos \
         WHERE complaint_id = ANY($1) ORDER BY uploaded_at, id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    let mut updates: HashMap<Uuid, Vec<UpdateEntry>> = HashMap::new();
    for u in update_rows {
        updates.entry(u.complaint_id).or_default().push(UpdateEntry {
            date: u.date,
            text: u.text,
            updated_by: u.updated_by,
        });
    }

    let mut supporters: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for s in supporter_rows {
        supporters.entry(s.complaint_id).or_default().push(s.user_id);
    }

    let mut photos: HashMap<Uuid, Vec<ResolutionPhoto>> = HashMap::new();
    for p in photo_rows {
        photos.entry(p.complaint_id).or_default().push(ResolutionPhoto {
            url: p.url,
            uploaded_at: p.uploaded_at,
            uploaded_by: p.uploaded_by,
        });
    }

    rows.into_iter()
        .map(|row| {
            let id = row.id;
            row.into_complaint(
                updates.remove(&id).unwrap_or_default(),
                supporters.remove(&id).unwrap_or_default(),
                photos.remove(&id).unwrap_or_default(),
            )
        })
        .collect()
}
