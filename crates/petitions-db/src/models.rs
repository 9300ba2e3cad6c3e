//! Write-side inputs and the helpers that turn SQLite TEXT columns back into
//! typed values. Read-side models live in `petitions-types`.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::Row;
use serde::de::DeserializeOwned;
use rusqlite::types::Type;
use uuid::Uuid;

use petitions_types::models::{CoPetitioner, SourceDocument};
use petitions_types::{PetitionStatus, Role};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub password_hash: String,
    pub profile_pic_url: Option<String>,
    pub role: Role,
    pub role_description: Option<String>,
}

/// Partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub password_hash: Option<String>,
    pub profile_pic_url: Option<String>,
    pub role: Option<Role>,
    pub role_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPetition {
    pub owner_id: String,
    pub petition_form_url: String,
    pub subject_matter: String,
    pub sources: Vec<SourceDocument>,
}

/// Everything a draft save replaces. Absent text fields are stored as NULL.
#[derive(Debug, Clone, Default)]
pub struct DraftContents {
    pub subject_matter: Option<String>,
    pub petition_form_url: Option<String>,
    pub sources: Vec<SourceDocument>,
    pub petitioner_identification: Option<String>,
    pub grievances: Option<String>,
    pub prayer: Option<String>,
    pub prior_efforts_confirmation: bool,
    pub legal_status_confirmation: bool,
    pub petitioners: Vec<CoPetitioner>,
}

#[derive(Debug, Clone)]
pub struct NewCoPetitioner {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub national_id: String,
}

/// Current time at the precision we store, so returned values equal stored ones.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339: lexical order matches chronological order.
pub(crate) fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    row.get::<_, String>(idx)?
        .parse()
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn time_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&row.get::<_, String>(idx)?)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn role_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Role> {
    row.get::<_, String>(idx)?
        .parse()
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn status_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<PetitionStatus> {
    row.get::<_, String>(idx)?
        .parse()
        .map_err(|e| conversion_error(idx, e))
}

/// A list stored as JSON text (sources, co-petitioners).
pub(crate) fn json_col<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<T>> {
    serde_json::from_str(&row.get::<_, String>(idx)?).map_err(|e| conversion_error(idx, e))
}

/// `Some` only for strings with non-whitespace content.
pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
