use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use petitions_db::{DraftContents, NewCoPetitioner};
use petitions_types::Capability;
use petitions_types::api::{AddCoPetitionerRequest, Claims, SaveDraftRequest};

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::middleware::authorize;

fn draft_contents(req: SaveDraftRequest) -> DraftContents {
    DraftContents {
        subject_matter: req.subject_matter,
        petition_form_url: req.petition_form_url,
        sources: req.sources,
        petitioner_identification: req.petitioner_identification,
        grievances: req.grievances,
        prayer: req.prayer,
        prior_efforts_confirmation: req.prior_efforts_confirmation,
        legal_status_confirmation: req.legal_status_confirmation,
        petitioners: req.petitioners,
    }
}

/// PUT /drafts/{id}
pub async fn save(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(draft_id): Path<Uuid>,
    Json(req): Json<SaveDraftRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = claims.sub.to_string();
    let contents = draft_contents(req);
    let draft = run_blocking(&state, move |db| Ok(db.save_draft(&owner, draft_id, &contents)?)).await?;

    Ok(Json(draft))
}

pub async fn load(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(draft_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = claims.sub.to_string();
    let draft = run_blocking(&state, move |db| Ok(db.load_draft(&owner, draft_id)?)).await?;
    Ok(Json(draft))
}

pub async fn discard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(draft_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = claims.sub.to_string();
    run_blocking(&state, move |db| Ok(db.delete_draft(&owner, draft_id)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /drafts/{id}/petitioners
pub async fn add_co_petitioner(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(draft_id): Path<Uuid>,
    Json(req): Json<AddCoPetitionerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = claims.sub.to_string();
    let new = NewCoPetitioner {
        name: req.name,
        address: req.address,
        phone: req.phone,
        national_id: req.national_id,
    };
    let draft = run_blocking(&state, move |db| Ok(db.add_co_petitioner(&owner, draft_id, &new)?)).await?;

    Ok((StatusCode::CREATED, Json(draft)))
}

/// DELETE /drafts/{id}/petitioners/{petitioner_id}
pub async fn remove_co_petitioner(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((draft_id, petitioner_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = claims.sub.to_string();
    let draft = run_blocking(&state, move |db| {
        Ok(db.remove_co_petitioner(&owner, draft_id, petitioner_id)?)
    })
    .await?;

    Ok(Json(draft))
}

/// POST /drafts/{id}/submit
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(draft_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, Capability::SubmitPetition)?;

    let owner = claims.sub.to_string();
    let petition = run_blocking(&state, move |db| Ok(db.submit_draft(&owner, draft_id)?)).await?;
    Ok((StatusCode::CREATED, Json(petition)))
}
