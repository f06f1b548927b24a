use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use civitas_common::{
    CivitasError, Complaint, ComplaintCategory, NewComplaint, Role, SimilarComplaint,
};
use civitas_store::SimilarQuery;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::rest::PublicUser;
use crate::AppState;

#[derive(Serialize)]
pub struct ComplaintList {
    pub count: usize,
    pub complaints: Vec<Complaint>,
}

#[derive(Serialize)]
pub struct SimilarList {
    pub count: usize,
    pub similar: Vec<SimilarComplaint>,
}

#[derive(Serialize)]
pub struct SupportResponse {
    pub support_count: u32,
}

#[derive(Serialize)]
pub struct CityStats {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

#[derive(Serialize)]
pub struct ComplaintDetail {
    pub complaint: Complaint,
    pub submitted_by: Option<PublicUser>,
    pub assigned_to: Option<PublicUser>,
}

pub async fn create_complaint(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<NewComplaint>,
) -> ApiResult<impl IntoResponse> {
    let complaint = state.writer.create_complaint(payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(complaint)))
}

pub async fn my_complaints(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ComplaintList>> {
    let complaints = state.reader.complaints_for_submitter(user.id).await?;
    Ok(Json(ComplaintList {
        count: complaints.len(),
        complaints,
    }))
}

#[derive(Deserialize)]
pub struct SimilarParams {
    lat: Option<f64>,
    lon: Option<f64>,
    category: Option<ComplaintCategory>,
    #[serde(alias = "desc")]
    description: Option<String>,
}

pub async fn similar_complaints(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<SimilarParams>,
) -> ApiResult<Json<SimilarList>> {
    let (Some(lat), Some(lon), Some(category), Some(description)) =
        (params.lat, params.lon, params.category, params.description)
    else {
        return Err(CivitasError::Validation(
            "location, category, and description are required to find similar complaints"
                .to_string(),
        )
        .into());
    };

    let similar = state
        .matcher
        .find_similar(&SimilarQuery {
            lat,
            lng: lon,
            category,
            description,
            exclude_user: user.id,
        })
        .await?;
    Ok(Json(SimilarList {
        count: similar.len(),
        similar,
    }))
}

#[derive(Deserialize)]
pub struct LocalParams {
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default = "default_radius_km")]
    radius: f64,
}

fn default_radius_km() -> f64 {
    5.0
}

pub async fn local_complaints(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<LocalParams>,
) -> ApiResult<Json<ComplaintList>> {
    let (Some(lat), Some(lon)) = (params.lat, params.lon) else {
        return Err(CivitasError::Validation(
            "latitude and longitude are required for local complaints".to_string(),
        )
        .into());
    };
    let complaints = state.reader.local_complaints(lat, lon, params.radius).await?;
    Ok(Json(ComplaintList {
        count: complaints.len(),
        complaints,
    }))
}

pub async fn city_stats(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> ApiResult<Json<CityStats>> {
    let stats = state.reader.category_stats().await?;
    Ok(Json(CityStats {
        labels: stats.iter().map(|s| s.category.to_string()).collect(),
        data: stats.iter().map(|s| s.count).collect(),
    }))
}

pub async fn complaint_detail(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ComplaintDetail>> {
    let complaint = state
        .reader
        .complaint_by_id(id)
        .await?
        .ok_or_else(|| CivitasError::NotFound("complaint not found".to_string()))?;

    let submitted_by = state.reader.user_by_id(complaint.submitted_by).await?;
    let assigned_to = match complaint.assigned_to {
        Some(assignee) => state.reader.user_by_id(assignee).await?,
        None => None,
    };

    Ok(Json(ComplaintDetail {
        complaint,
        submitted_by: submitted_by.map(Into::into),
        assigned_to: assigned_to.map(Into::into),
    }))
}

pub async fn reraise_complaint(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Complaint>> {
    let complaint = state.writer.reraise(id, user.id).await?;
    Ok(Json(complaint))
}

pub async fn support_complaint(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SupportResponse>> {
    let support_count = state.writer.support(id, user.id).await?;
    Ok(Json(SupportResponse { support_count }))
}

#[derive(Deserialize)]
pub struct ResolutionBody {
    pub note: Option<String>,
    pub photo: Option<String>,
}

pub async fn submit_resolution(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ResolutionBody>,
) -> ApiResult<Json<Complaint>> {
    if user.role != Role::Ngo {
        return Err(CivitasError::Forbidden(
            "only assignee organizations may submit resolution updates".to_string(),
        )
        .into());
    }
    let complaint = state
        .writer
        .submit_resolution_update(id, body.note.as_deref(), body.photo.as_deref(), user.id)
        .await?;
    Ok(Json(complaint))
}

#[derive(Deserialize)]
pub struct FeedbackBody {
    pub rating: u8,
    pub comment: Option<String>,
}

pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<FeedbackBody>,
) -> ApiResult<Json<Complaint>> {
    let complaint = state
        .writer
        .submit_feedback(id, user.id, body.rating, body.comment.as_deref())
        .await?;
    Ok(Json(complaint))
}
