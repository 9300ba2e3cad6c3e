use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{info, warn};
use uuid::Uuid;

use petitions_types::PetitionStatus;
use petitions_types::models::{Petition, PetitionOwner, PetitionWithOwner};

use crate::models::{NewPetition, format_time, non_blank, now, json_col, status_col, time_col, uuid_col};
use crate::users::user_exists;
use crate::{Database, StoreError, StoreResult};

const PETITION_COLUMNS: &str = "p.id, p.submitted_by_user_id, p.petition_form_url, p.subject_matter, \
     p.sources, p.status, p.created_at, p.updated_at";

// LEFT JOIN users to fetch the owner's name in the same query
const JOINED_SELECT: &str = "SELECT p.id, p.submitted_by_user_id, p.petition_form_url, p.subject_matter, \
     p.sources, p.status, p.created_at, p.updated_at, u.id, u.first_name, u.last_name \
     FROM submitted_petitions p \
     LEFT JOIN users u ON p.submitted_by_user_id = u.id";

impl Database {
    /// Records a new petition with status `PENDING`.
    pub fn submit_petition(&self, new: &NewPetition) -> StoreResult<Petition> {
        self.with_conn(|conn| insert_petition(conn, new))
    }

    pub fn list_petitions_by_owner(&self, owner_id: &str) -> StoreResult<Vec<PetitionWithOwner>> {
        self.with_conn(|conn| {
            let sql = format!("{JOINED_SELECT} WHERE p.submitted_by_user_id = ?1 ORDER BY p.created_at");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner_id], map_joined)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_petitions_by_status(&self, status: PetitionStatus) -> StoreResult<Vec<PetitionWithOwner>> {
        self.with_conn(|conn| {
            let sql = format!("{JOINED_SELECT} WHERE p.status = ?1 ORDER BY p.created_at");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([status.as_str()], map_joined)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_petition(&self, id: &str) -> StoreResult<PetitionWithOwner> {
        self.with_conn(|conn| {
            let sql = format!("{JOINED_SELECT} WHERE p.id = ?1");
            let row = conn.query_row(&sql, [id], map_joined).optional()?;
            Ok(row)
        })?
        .ok_or(StoreError::NotFound("petition"))
    }

    /// Sets the status and stamps `updated_at`. Never creates a row.
    pub fn update_petition_status(&self, id: &str, status: PetitionStatus) -> StoreResult<Petition> {
        let petition = self.with_conn(|conn| set_status(conn, id, status))?;
        info!("Petition {} status set to {}", id, status);
        Ok(petition)
    }
}

pub(crate) fn insert_petition(conn: &Connection, new: &NewPetition) -> StoreResult<Petition> {
    let Some(owner_id) = non_blank(&new.owner_id) else {
        warn!("Petition submission without an owner id");
        return Err(StoreError::validation("owner id is required"));
    };
    let petition_form_url = non_blank(&new.petition_form_url)
        .ok_or_else(|| StoreError::validation("petition form url is required"))?;
    let subject_matter = non_blank(&new.subject_matter)
        .ok_or_else(|| StoreError::validation("subject matter is required"))?;
    let owner: Uuid = owner_id
        .parse()
        .map_err(|_| StoreError::validation("owner id is not a valid id"))?;

    if !user_exists(conn, owner_id)? {
        return Err(StoreError::NotFound("user"));
    }

    let id = Uuid::new_v4();
    let created_at = now();
    let stamp = format_time(&created_at);
    let status = PetitionStatus::Pending;

    conn.execute(
        "INSERT INTO submitted_petitions
             (id, submitted_by_user_id, petition_form_url, subject_matter, sources, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            id.to_string(),
            owner_id,
            petition_form_url,
            subject_matter,
            serde_json::to_string(&new.sources)?,
            status.as_str(),
            &stamp,
        ],
    )?;

    info!("Petition {} submitted by {} with {} sources", id, owner_id, new.sources.len());

    Ok(Petition {
        id,
        submitted_by_user_id: owner,
        petition_form_url: petition_form_url.to_string(),
        subject_matter: subject_matter.to_string(),
        sources: new.sources.clone(),
        status,
        created_at,
        updated_at: created_at,
    })
}

pub(crate) fn set_status(conn: &Connection, id: &str, status: PetitionStatus) -> StoreResult<Petition> {
    let changed = conn.execute(
        "UPDATE submitted_petitions SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), format_time(&now()), id],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("petition"));
    }

    let sql = format!("SELECT {PETITION_COLUMNS} FROM submitted_petitions p WHERE p.id = ?1");
    Ok(conn.query_row(&sql, [id], map_petition)?)
}

pub(crate) fn petition_owner(conn: &Connection, id: &str) -> StoreResult<Option<String>> {
    let owner = conn
        .query_row(
            "SELECT submitted_by_user_id FROM submitted_petitions WHERE id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(owner)
}

fn map_petition(row: &Row<'_>) -> rusqlite::Result<Petition> {
    Ok(Petition {
        id: uuid_col(row, 0)?,
        submitted_by_user_id: uuid_col(row, 1)?,
        petition_form_url: row.get(2)?,
        subject_matter: row.get(3)?,
        sources: json_col(row, 4)?,
        status: status_col(row, 5)?,
        created_at: time_col(row, 6)?,
        updated_at: time_col(row, 7)?,
    })
}

fn map_joined(row: &Row<'_>) -> rusqlite::Result<PetitionWithOwner> {
    let owner = match row.get::<_, Option<String>>(8)? {
        Some(_) => Some(PetitionOwner {
            id: uuid_col(row, 8)?,
            first_name: row.get(9)?,
            last_name: row.get(10)?,
        }),
        None => None,
    };

    Ok(PetitionWithOwner {
        petition: map_petition(row)?,
        owner,
    })
}
