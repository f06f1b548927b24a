use chrono::Utc;
use sqlx::{Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use civitas_common::{
    geo, CivitasError, Complaint, ComplaintStatus, DirectoryUser, GeoPolygon, NewComplaint,
    ResolutionPhoto, Result,
};

use crate::lifecycle;
use crate::rows::{self, db_err};
use crate::StoreClient;

/// All lifecycle mutations. Every method locks the target row, runs the
/// matching pure guard from [`crate::lifecycle`], and applies the effect
/// inside one transaction; audit-log appends are single INSERTs.
#[derive(Clone)]
pub struct ComplaintWriter {
    client: StoreClient,
}

impl ComplaintWriter {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Create a complaint. Enters `Pending` with an empty audit log.
    pub async fn create_complaint(
        &self,
        new: NewComplaint,
        submitted_by: Uuid,
    ) -> Result<Complaint> {
        lifecycle::validate_new_complaint(&new)?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let bucket = geo::bucket(new.location.lat, new.location.lng).ok_or_else(|| {
            CivitasError::Validation("Valid coordinates are required".to_string())
        })?;

        sqlx::query(
            "INSERT INTO complaints \
                (id, category, sub_type, description, address, lat, lng, geohash6, \
                 photo, severity, status, submitted_at, reraised_count, submitted_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 0, $13)",
        )
        .bind(id)
        .bind(new.category.as_str())
        .bind(new.sub_type.trim())
        .bind(new.description.trim())
        .bind(new.address.trim())
        .bind(new.location.lat)
        .bind(new.location.lng)
        .bind(&bucket)
        .bind(new.photo.trim())
        .bind(new.severity.to_string())
        .bind(ComplaintStatus::Pending.to_string())
        .bind(now)
        .bind(submitted_by)
        .execute(&self.client.pool)
        .await
        .map_err(db_err)?;

        info!(complaint_id = %id, category = %new.category, "Complaint created");

        Ok(Complaint {
            id,
            category: new.category,
            sub_type: new.sub_type.trim().to_string(),
            description: new.description.trim().to_string(),
            address: new.address.trim().to_string(),
            location: new.location,
            photo: new.photo.trim().to_string(),
            severity: new.severity,
            status: ComplaintStatus::Pending,
            submitted_at: now,
            reraised_count: 0,
            submitted_by,
            assigned_to: None,
            updates: Vec::new(),
            supported_by: Vec::new(),
            before_after_photos: Vec::new(),
            feedback: None,
        })
    }

    /// Submitter escalation: bump the counter and append one log entry.
    pub async fn reraise(&self, id: Uuid, actor: Uuid) -> Result<Complaint> {
        let mut tx = self.begin().await?;
        let row = rows::lock_complaint(&mut *tx, id).await?;
        lifecycle::check_reraise(row.status()?, row.submitted_by, actor)?;

        let new_count = row.reraised_count + 1;
        sqlx::query("UPDATE complaints SET reraised_count = $2 WHERE id = $1")
            .bind(id)
            .bind(new_count)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        append_update(
            &mut tx,
            id,
            &format!("Complaint reraised by submitter (count: {new_count})."),
            actor,
        )
        .await?;
        tx.commit().await.map_err(db_err)?;

        self.fetch(id).await
    }

    /// Co-sign a complaint. Returns the new support count; a repeat call
    /// by the same user is a `Conflict` and never doubles the row.
    pub async fn support(&self, id: Uuid, actor: Uuid) -> Result<u32> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM complaints WHERE id = $1")
            .bind(id)
            .fetch_one(&self.client.pool)
            .await
            .map_err(db_err)?;
        if exists == 0 {
            return Err(CivitasError::NotFound("complaint not found".to_string()));
        }

        let inserted = sqlx::query(
            "INSERT INTO complaint_supporters (complaint_id, user_id, supported_at) \
             VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(actor)
        .bind(Utc::now())
        .execute(&self.client.pool)
        .await
        .map_err(db_err)?;
        if inserted.rows_affected() == 0 {
            return Err(CivitasError::Conflict(
                "you have already supported this complaint".to_string(),
            ));
        }

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM complaint_supporters WHERE complaint_id = $1",
        )
        .bind(id)
        .fetch_one(&self.client.pool)
        .await
        .map_err(db_err)?;
        Ok(count.max(0) as u32)
    }

    /// Administrative assignment. Auto-advances `Pending` complaints to
    /// `Process Ongoing` and appends one entry naming actor and assignee.
    /// Notification dispatch is the caller's concern and must never gate
    /// this write.
    pub async fn assign(
        &self,
        id: Uuid,
        assignee: &DirectoryUser,
        actor: Uuid,
        actor_label: &str,
    ) -> Result<Complaint> {
        let mut tx = self.begin().await?;
        let row = rows::lock_complaint(&mut *tx, id).await?;
        let new_status = lifecycle::decide_assign(row.status()?, row.assigned_to, assignee.id)?;

        match new_status {
            Some(status) => {
                sqlx::query("UPDATE complaints SET assigned_to = $2, status = $3 WHERE id = $1")
                    .bind(id)
                    .bind(assignee.id)
                    .bind(status.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
            }
            None => {
                sqlx::query("UPDATE complaints SET assigned_to = $2 WHERE id = $1")
                    .bind(id)
                    .bind(assignee.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
            }
        }
        append_update(
            &mut tx,
            id,
            &format!("Complaint assigned to {} by admin {actor_label}.", assignee.name),
            actor,
        )
        .await?;
        tx.commit().await.map_err(db_err)?;

        info!(complaint_id = %id, assignee = %assignee.id, "Complaint assigned");
        self.fetch(id).await
    }

    /// Administrative status/notes override.
    pub async fn update_status(
        &self,
        id: Uuid,
        requested: Option<ComplaintStatus>,
        note: Option<&str>,
        actor: Uuid,
    ) -> Result<Complaint> {
        let mut tx = self.begin().await?;
        let row = rows::lock_complaint(&mut *tx, id).await?;
        let change = lifecycle::decide_status_update(row.status()?, requested, note)?;

        if let Some(status) = change.status {
            sqlx::query("UPDATE complaints SET status = $2 WHERE id = $1")
                .bind(id)
                .bind(status.to_string())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }
        append_update(&mut tx, id, &change.entry, actor).await?;
        tx.commit().await.map_err(db_err)?;

        self.fetch(id).await
    }

    /// Assignee progress report: note and/or "after" photo. Forces the
    /// status to `Process Ongoing`; closure stays an administrator action.
    pub async fn submit_resolution_update(
        &self,
        id: Uuid,
        note: Option<&str>,
        photo: Option<&str>,
        actor: Uuid,
    ) -> Result<Complaint> {
        let mut tx = self.begin().await?;
        let row = rows::lock_complaint(&mut *tx, id).await?;
        lifecycle::check_resolution_update(row.status()?, row.assigned_to, actor, note, photo)?;

        sqlx::query("UPDATE complaints SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(ComplaintStatus::ProcessOngoing.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        if let Some(url) = photo.map(str::trim).filter(|p| !p.is_empty()) {
            sqlx::query(
                "INSERT INTO complaint_photos (complaint_id, url, uploaded_at, uploaded_by) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(url)
            .bind(Utc::now())
            .bind(actor)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        let entry = match note.map(str::trim).filter(|n| !n.is_empty()) {
            Some(note) => format!("NGO report: {note}"),
            None => "Resolution photo submitted.".to_string(),
        };
        append_update(&mut tx, id, &entry, actor).await?;
        tx.commit().await.map_err(db_err)?;

        self.fetch(id).await
    }

    /// Post-resolution citizen feedback; a one-shot field write.
    pub async fn submit_feedback(
        &self,
        id: Uuid,
        actor: Uuid,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<Complaint> {
        let mut tx = self.begin().await?;
        let row = rows::lock_complaint(&mut *tx, id).await?;
        lifecycle::check_feedback(
            row.status()?,
            row.submitted_by,
            actor,
            row.feedback_submitted_at.is_some(),
            rating,
        )?;

        sqlx::query(
            "UPDATE complaints SET feedback_rating = $2, feedback_comment = $3, \
             feedback_submitted_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(rating as i16)
        .bind(comment.map(str::trim).filter(|c| !c.is_empty()))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        self.fetch(id).await
    }

    /// Record a before/after photo reference against a complaint.
    pub async fn record_photo(
        &self,
        id: Uuid,
        url: &str,
        uploaded_by: Uuid,
    ) -> Result<ResolutionPhoto> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CivitasError::Validation(
                "photo reference is required".to_string(),
            ));
        }
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM complaints WHERE id = $1")
            .bind(id)
            .fetch_one(&self.client.pool)
            .await
            .map_err(db_err)?;
        if exists == 0 {
            return Err(CivitasError::NotFound("complaint not found".to_string()));
        }

        let uploaded_at = Utc::now();
        sqlx::query(
            "INSERT INTO complaint_photos (complaint_id, url, uploaded_at, uploaded_by) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(url)
        .bind(uploaded_at)
        .bind(uploaded_by)
        .execute(&self.client.pool)
        .await
        .map_err(db_err)?;

        Ok(ResolutionPhoto {
            url: url.to_string(),
            uploaded_at,
            uploaded_by,
        })
    }

    /// Administrative deletion. Child logs cascade; returns the stored
    /// photo references so the caller can clean up the external store.
    pub async fn delete_complaint(&self, id: Uuid) -> Result<Vec<String>> {
        let mut tx = self.begin().await?;
        let row = rows::lock_complaint(&mut *tx, id).await?;

        let mut refs = vec![row.photo.clone()];
        let extra: Vec<String> = sqlx::query_scalar::<_, String>(
            "SELECT url FROM complaint_photos WHERE complaint_id = $1 ORDER BY uploaded_at",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;
        refs.extend(extra);

        sqlx::query("DELETE FROM complaints WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        info!(complaint_id = %id, photos = refs.len(), "Complaint deleted");
        Ok(refs)
    }

    /// Create or refresh a locality polygon, keyed by its unique name.
    pub async fn upsert_locality(&self, name: &str, geometry: &GeoPolygon) -> Result<Uuid> {
        let geometry = serde_json::to_value(geometry)
            .map_err(|e| CivitasError::Database(e.to_string()))?;
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO localities (id, name, geometry) VALUES ($1, $2, $3) \
             ON CONFLICT (name) DO UPDATE SET geometry = EXCLUDED.geometry \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(geometry)
        .fetch_one(&self.client.pool)
        .await
        .map_err(db_err)
    }

    /// Seed or refresh a directory entry. The directory is otherwise
    /// read-only from this repo's perspective.
    pub async fn upsert_user(&self, user: &DirectoryUser) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, \
             email = EXCLUDED.email, role = EXCLUDED.role",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.to_string())
        .execute(&self.client.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        self.client.pool.begin().await.map_err(db_err)
    }

    async fn fetch(&self, id: Uuid) -> Result<Complaint> {
        rows::fetch_complaint(&self.client.pool, id)
            .await?
            .ok_or_else(|| CivitasError::NotFound("complaint not found".to_string()))
    }
}

/// Append one audit-log entry. A single INSERT, so concurrent appends on
/// the same complaint never overwrite each other.
async fn append_update(
    tx: &mut Transaction<'static, Postgres>,
    complaint_id: Uuid,
    text: &str,
    updated_by: Uuid,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO complaint_updates (complaint_id, date, text, updated_by) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(complaint_id)
    .bind(Utc::now())
    .bind(text)
    .bind(updated_by)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}
