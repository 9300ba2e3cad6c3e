use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use petitions_db::NewPetition;
use petitions_types::api::{AppendStepRequest, Claims, StatusChangeRequest, StatusQuery, SubmitPetitionRequest, UpdateStatusRequest};
use petitions_types::{Capability, PetitionStatus};

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::middleware::{authorize, authorize_owner_or};

fn parse_status(raw: &str) -> Result<PetitionStatus, ApiError> {
    raw.parse().map_err(|e: petitions_types::status::UnknownStatus| ApiError::bad_request(e.to_string()))
}

/// POST /petitions
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitPetitionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, Capability::SubmitPetition)?;

    let new = NewPetition {
        owner_id: claims.sub.to_string(),
        petition_form_url: req.petition_form_url,
        subject_matter: req.subject_matter,
        sources: req.sources,
    };
    let petition = run_blocking(&state, move |db| Ok(db.submit_petition(&new)?)).await?;

    Ok((StatusCode::CREATED, Json(petition)))
}

/// GET /petitions/mine
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = claims.sub.to_string();
    let petitions = run_blocking(&state, move |db| Ok(db.list_petitions_by_owner(&owner)?)).await?;
    Ok(Json(petitions))
}

/// GET /petitions?status=
pub async fn list_by_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, Capability::ReviewPetitions)?;
    let status = parse_status(&query.status)?;

    let petitions = run_blocking(&state, move |db| Ok(db.list_petitions_by_status(status)?)).await?;
    Ok(Json(petitions))
}

pub async fn get_petition(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(petition_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let petition = run_blocking(&state, move |db| Ok(db.get_petition(&petition_id.to_string())?)).await?;
    authorize_owner_or(&claims, petition.petition.submitted_by_user_id, Capability::ReviewPetitions)?;

    Ok(Json(petition))
}

/// PUT /petitions/{id}/status: status only; pair with a step append, or use
/// the status-changes route to write both at once.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(petition_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, Capability::RecordStatusChange)?;
    let status = parse_status(&req.status)?;

    let petition = run_blocking(&state, move |db| {
        Ok(db.update_petition_status(&petition_id.to_string(), status)?)
    })
    .await?;

    Ok(Json(petition))
}

pub async fn list_steps(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(petition_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = claims.clone();
    let steps = run_blocking(&state, move |db| {
        let id = petition_id.to_string();
        let petition = db.get_petition(&id)?;
        authorize_owner_or(&viewer, petition.petition.submitted_by_user_id, Capability::ReviewPetitions)?;
        Ok(db.list_steps(&id)?)
    })
    .await?;

    Ok(Json(steps))
}

pub async fn append_step(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(petition_id): Path<Uuid>,
    Json(req): Json<AppendStepRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, Capability::RecordStatusChange)?;

    let step = run_blocking(&state, move |db| {
        Ok(db.append_step(&petition_id.to_string(), &req.title, &req.description)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(step)))
}

/// POST /petitions/{id}/status-changes: status and step in one transaction.
pub async fn record_status_change(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(petition_id): Path<Uuid>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, Capability::RecordStatusChange)?;
    let status = parse_status(&req.status)?;

    let change = run_blocking(&state, move |db| {
        Ok(db.record_status_change(&petition_id.to_string(), status, req.title.as_deref(), &req.note)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(change)))
}
