use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use civitas_common::{CivitasError, Complaint, ComplaintStatus, ResolutionPhoto};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::rest::PublicUser;
use crate::AppState;

/// A complaint annotated with the routing table's advisory suggestion.
#[derive(Serialize)]
pub struct AnnotatedComplaint {
    #[serde(flatten)]
    pub complaint: Complaint,
    pub suggested_assignee_id: String,
}

#[derive(Serialize)]
pub struct AnnotatedComplaintList {
    pub count: usize,
    pub complaints: Vec<AnnotatedComplaint>,
}

#[derive(Serialize)]
pub struct AdminComplaintDetail {
    pub complaint: Complaint,
    pub suggested_assignee_id: String,
    pub submitted_by: Option<PublicUser>,
    pub assigned_to: Option<PublicUser>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    /// Opaque photo references for the upload collaborator to clean up.
    pub photo_refs: Vec<String>,
}

pub async fn all_complaints(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> ApiResult<Json<AnnotatedComplaintList>> {
    let complaints = state.reader.all_complaints().await?;
    let complaints: Vec<AnnotatedComplaint> = complaints
        .into_iter()
        .map(|complaint| {
            let suggested_assignee_id = state
                .router
                .suggest(complaint.category, &complaint.sub_type)
                .to_string();
            AnnotatedComplaint {
                complaint,
                suggested_assignee_id,
            }
        })
        .collect();
    Ok(Json(AnnotatedComplaintList {
        count: complaints.len(),
        complaints,
    }))
}

pub async fn complaint_detail(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AdminComplaintDetail>> {
    let complaint = state
        .reader
        .complaint_by_id(id)
        .await?
        .ok_or_else(|| CivitasError::NotFound("complaint not found".to_string()))?;

    let suggested_assignee_id = state
        .router
        .suggest(complaint.category, &complaint.sub_type)
        .to_string();
    let submitted_by = state.reader.user_by_id(complaint.submitted_by).await?;
    let assigned_to = match complaint.assigned_to {
        Some(assignee) => state.reader.user_by_id(assignee).await?,
        None => None,
    };

    Ok(Json(AdminComplaintDetail {
        complaint,
        suggested_assignee_id,
        submitted_by: submitted_by.map(Into::into),
        assigned_to: assigned_to.map(Into::into),
    }))
}

#[derive(Deserialize)]
pub struct AssignBody {
    pub assigned_to_id: Uuid,
}

pub async fn assign_complaint(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AssignBody>,
) -> ApiResult<Json<Complaint>> {
    let assignee = state
        .reader
        .user_by_id(body.assigned_to_id)
        .await?
        .ok_or_else(|| CivitasError::NotFound("assignee not found".to_string()))?;
    let actor_label = state
        .reader
        .user_by_id(admin.id)
        .await?
        .map(|u| u.name)
        .unwrap_or_else(|| "Admin".to_string());

    let complaint = state.writer.assign(id, &assignee, admin.id, &actor_label).await?;

    // Best-effort notification; the assignment is already committed and
    // the response never waits on the mail provider.
    let notifier = state.notifier.clone();
    let for_mail = complaint.clone();
    tokio::spawn(async move {
        notifier.notify_assignment(&for_mail, &assignee, &actor_label).await;
    });

    Ok(Json(complaint))
}

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: Option<ComplaintStatus>,
    pub note: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<Complaint>> {
    let complaint = state
        .writer
        .update_status(id, body.status, body.note.as_deref(), admin.id)
        .await?;
    Ok(Json(complaint))
}

#[derive(Deserialize)]
pub struct PhotoBody {
    pub url: String,
}

pub async fn record_photo(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<PhotoBody>,
) -> ApiResult<Json<ResolutionPhoto>> {
    let photo = state.writer.record_photo(id, &body.url, admin.id).await?;
    Ok(Json(photo))
}

pub async fn delete_complaint(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let photo_refs = state.writer.delete_complaint(id).await?;
    Ok(Json(DeleteResponse {
        deleted: true,
        photo_refs,
    }))
}
