use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AuthenticatedUser, CoPetitioner, SourceDocument};
use crate::roles::Role;

// -- JWT Claims --

/// Session carried by every authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub password: String,
    pub profile_pic_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthenticatedUser,
}

// -- Users --

/// Admin-side account creation: registration plus an explicit role.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserRequest {
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

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub password: Option<String>,
    pub profile_pic_url: Option<String>,
    pub role: Option<Role>,
    pub role_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: Option<String>,
}

// -- Petitions --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmitPetitionRequest {
    pub petition_form_url: String,
    pub subject_matter: String,
    #[serde(default)]
    pub sources: Vec<SourceDocument>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendStepRequest {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusChangeRequest {
    pub status: String,
    /// Defaults to the status label.
    pub title: Option<String>,
    pub note: String,
}

// -- Drafts --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SaveDraftRequest {
    pub subject_matter: Option<String>,
    pub petition_form_url: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceDocument>,
    pub petitioner_identification: Option<String>,
    pub grievances: Option<String>,
    pub prayer: Option<String>,
    #[serde(default)]
    pub prior_efforts_confirmation: bool,
    #[serde(default)]
    pub legal_status_confirmation: bool,
    #[serde(default)]
    pub petitioners: Vec<CoPetitioner>,
}

/// A co-petitioner to add; the server assigns the id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddCoPetitionerRequest {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub national_id: String,
}

// -- Uploads --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub file_name: String,
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub path: String,
    pub file_name: String,
    pub size: u64,
    pub sha256: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
