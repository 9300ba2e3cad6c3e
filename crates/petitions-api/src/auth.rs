use std::sync::{Arc, OnceLock};

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};

use petitions_db::{Database, NewUser};
use petitions_types::Role;
use petitions_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest};
use petitions_types::models::{AuthenticatedUser, User};

use crate::error::ApiError;
use crate::extract::Json;
use crate::storage::ObjectStorage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// `None` when no bucket is configured; uploads are then refused.
    pub storage: Option<ObjectStorage>,
}

const MIN_PASSWORD_LEN: usize = 8;
const TOKEN_TTL_DAYS: i64 = 7;

/// Account fields shared by self-registration and admin-created users.
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub password: String,
    pub profile_pic_url: Option<String>,
    pub role: Role,
    pub role_description: Option<String>,
}

impl From<RegisterRequest> for NewAccount {
    fn from(req: RegisterRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            national_id: req.national_id,
            password: req.password,
            profile_pic_url: req.profile_pic_url,
            role: Role::Petitioner,
            role_description: Some("public".to_string()),
        }
    }
}

/// Run blocking database (and hashing) work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal(e)
        })?
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(&state, move |db| register_account(db, req.into())).await?;
    let user = AuthenticatedUser::from(user);
    let token = create_token(&state.jwt_secret, &user).map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(LoginResponse { token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(&state, move |db| authenticate(db, &req.email, &req.password)).await?;
    let token = create_token(&state.jwt_secret, &user).map_err(ApiError::internal)?;

    Ok(Json(LoginResponse { token, user }))
}

/// Validates, hashes the password and stores the account.
pub fn register_account(db: &Database, account: NewAccount) -> Result<User, ApiError> {
    if !account.email.contains('@') {
        return Err(ApiError::bad_request("email address is invalid"));
    }
    validate_password(&account.password)?;

    let password_hash = hash_password(&account.password)?;

    let user = db.create_user(&NewUser {
        first_name: account.first_name,
        last_name: account.last_name,
        email: account.email.trim().to_string(),
        phone: account.phone,
        national_id: account.national_id,
        password_hash,
        profile_pic_url: account.profile_pic_url,
        role: account.role,
        role_description: account.role_description,
    })?;

    Ok(user)
}

/// Unknown email and wrong password fail identically. The email is trimmed
/// the same way registration stores it.
pub fn authenticate(db: &Database, email: &str, password: &str) -> Result<AuthenticatedUser, ApiError> {
    let Some(creds) = db.get_credentials(email.trim())? else {
        // Burn the same hashing work so response time does not reveal the account
        let _ = verify_password(password, dummy_hash());
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(password, &creds.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    Ok(creds.user.into())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Argon2id with a random salt, PHC string format.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(ApiError::internal)
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        error!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("not-a-real-password").unwrap_or_default())
}

pub fn create_token(secret: &str, user: &AuthenticatedUser) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Creates the first administrator if no account uses `email` yet.
pub fn bootstrap_admin(db: &Database, email: &str, password: &str) -> Result<(), ApiError> {
    if db.get_user_by_email(email)?.is_some() {
        return Ok(());
    }

    let admin = register_account(
        db,
        NewAccount {
            first_name: "System".into(),
            last_name: "Administrator".into(),
            email: email.to_string(),
            phone: "0000000000".into(),
            national_id: format!("admin:{email}"),
            password: password.to_string(),
            profile_pic_url: None,
            role: Role::Admin,
            role_description: Some("portal administrator".into()),
        },
    )?;

    info!("Bootstrapped administrator account {}", admin.id);
    Ok(())
}
