use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::Role;
use crate::status::PetitionStatus;

/// A registered account. The password hash never leaves the db crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub profile_pic_url: Option<String>,
    pub role: Role,
    pub role_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a successful login reveals about the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub role_description: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            role_description: user.role_description,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// A supporting evidence file attached to a petition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Petition {
    pub id: Uuid,
    pub submitted_by_user_id: Uuid,
    pub petition_form_url: String,
    pub subject_matter: String,
    pub sources: Vec<SourceDocument>,
    pub status: PetitionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionOwner {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

/// Petition joined with the submitting user's name, as listed to clerks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionWithOwner {
    #[serde(flatten)]
    pub petition: Petition,
    pub owner: Option<PetitionOwner>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStep {
    pub id: Uuid,
    pub petition_id: Uuid,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of an atomic status change: the updated petition and the step
/// recorded alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub petition: Petition,
    pub step: VerificationStep,
}

/// A person signing the petition alongside its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoPetitioner {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub national_id: String,
}

/// An unfinished submission, saved explicitly by the petitioner.
///
/// Besides the submission fields it carries the petition form itself:
/// identification, grievances, prayer, the two confirmations and the list
/// of co-petitioners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionDraft {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub subject_matter: Option<String>,
    pub petition_form_url: Option<String>,
    pub sources: Vec<SourceDocument>,
    pub petitioner_identification: Option<String>,
    pub grievances: Option<String>,
    pub prayer: Option<String>,
    pub prior_efforts_confirmation: bool,
    pub legal_status_confirmation: bool,
    pub petitioners: Vec<CoPetitioner>,
    pub updated_at: DateTime<Utc>,
}
