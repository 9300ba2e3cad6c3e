use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::warn;
use uuid::Uuid;

use petitions_db::StoreError;
use petitions_types::Capability;
use petitions_types::api::Claims;

use crate::auth::{AppState, run_blocking};
use crate::error::ApiError;

/// Validate the bearer JWT and attach the caller's claims to the request.
///
/// The role is re-read from the database so role changes and deleted
/// accounts take effect without waiting for the token to expire.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;
    let mut claims = token_data.claims;

    let user_id = claims.sub.to_string();
    let user = run_blocking(&state, move |db| Ok(db.get_user(&user_id)?))
        .await
        .map_err(|e| match e {
            ApiError::Store(StoreError::NotFound(_)) => ApiError::Unauthorized,
            other => other,
        })?;
    claims.role = user.role;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// The single authorization check every protected handler goes through.
pub fn authorize(claims: &Claims, capability: Capability) -> Result<(), ApiError> {
    if claims.role.allows(capability) {
        Ok(())
    } else {
        warn!("User {} ({}) denied {:?}", claims.sub, claims.role, capability);
        Err(ApiError::Forbidden)
    }
}

/// Owners may always act on their own records; everyone else needs `capability`.
pub fn authorize_owner_or(claims: &Claims, owner: Uuid, capability: Capability) -> Result<(), ApiError> {
    if claims.sub == owner {
        return Ok(());
    }
    authorize(claims, capability)
}
