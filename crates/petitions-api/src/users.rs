use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use petitions_db::UserChanges;
use petitions_types::Capability;
use petitions_types::api::{Claims, CreateUserRequest, RoleQuery, UpdateUserRequest};

use crate::auth::{AppState, NewAccount, hash_password, register_account, run_blocking, validate_password};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::middleware::{authorize, authorize_owner_or};

/// GET /users/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = claims.sub.to_string();
    let user = run_blocking(&state, move |db| Ok(db.get_user(&id)?)).await?;
    Ok(Json(user))
}

/// GET /users?role=: all users, or those holding one role.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<RoleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, Capability::ManageUsers)?;

    let users = run_blocking(&state, move |db| {
        Ok(match query.role {
            Some(role) => db.list_users_by_role(&role)?,
            None => db.list_users()?,
        })
    })
    .await?;

    Ok(Json(users))
}

/// POST /users: admins create clerks, speakers and committee members.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, Capability::ManageUsers)?;

    let account = NewAccount {
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        phone: req.phone,
        national_id: req.national_id,
        password: req.password,
        profile_pic_url: req.profile_pic_url,
        role: req.role,
        role_description: req.role_description,
    };
    let user = run_blocking(&state, move |db| register_account(db, account)).await?;

    info!("Admin {} created {} account {}", claims.sub, user.role, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_owner_or(&claims, user_id, Capability::ManageUsers)?;

    let user = run_blocking(&state, move |db| Ok(db.get_user(&user_id.to_string())?)).await?;
    Ok(Json(user))
}

/// PATCH /users/{id}: profile edits by the user; role changes by admins only.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_owner_or(&claims, user_id, Capability::ManageUsers)?;
    if req.role.is_some() || req.role_description.is_some() {
        authorize(&claims, Capability::ManageUsers)?;
    }

    let user = run_blocking(&state, move |db| {
        let password_hash = match req.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            national_id: req.national_id,
            password_hash,
            profile_pic_url: req.profile_pic_url,
            role: req.role,
            role_description: req.role_description,
        };
        Ok(db.update_user(&user_id.to_string(), &changes)?)
    })
    .await?;

    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, Capability::ManageUsers)?;

    run_blocking(&state, move |db| Ok(db.delete_user(&user_id.to_string())?)).await?;

    info!("Admin {} deleted user {}", claims.sub, user_id);
    Ok(StatusCode::NO_CONTENT)
}
