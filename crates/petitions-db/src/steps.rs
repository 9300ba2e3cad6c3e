use rusqlite::{Connection, Row, params};
use tracing::{info, warn};
use uuid::Uuid;

use petitions_types::models::VerificationStep;

use crate::models::{format_time, non_blank, now, time_col, uuid_col};
use crate::petitions::petition_owner;
use crate::{Database, StoreError, StoreResult};

impl Database {
    /// Appends to a petition's processing log. Steps are never edited or removed
    /// except by cascade.
    pub fn append_step(&self, petition_id: &str, title: &str, description: &str) -> StoreResult<VerificationStep> {
        self.with_conn(|conn| insert_step(conn, petition_id, title, description))
    }

    /// Oldest first. An empty vector means the petition has no steps yet.
    pub fn list_steps(&self, petition_id: &str) -> StoreResult<Vec<VerificationStep>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, petition_id, title, description, timestamp
                 FROM verification_steps
                 WHERE petition_id = ?1
                 ORDER BY timestamp ASC, rowid ASC",
            )?;
            let steps = stmt
                .query_map([petition_id], map_step)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(steps)
        })
    }
}

pub(crate) fn insert_step(
    conn: &Connection,
    petition_id: &str,
    title: &str,
    description: &str,
) -> StoreResult<VerificationStep> {
    let (Some(petition_id), Some(title), Some(description)) =
        (non_blank(petition_id), non_blank(title), non_blank(description))
    else {
        warn!("Verification step rejected: petition id, title and description are required");
        return Err(StoreError::validation("petition id, title and description are required"));
    };
    let petition: Uuid = petition_id
        .parse()
        .map_err(|_| StoreError::validation("petition id is not a valid id"))?;

    if petition_owner(conn, petition_id)?.is_none() {
        return Err(StoreError::NotFound("petition"));
    }

    let id = Uuid::new_v4();
    let timestamp = now();

    conn.execute(
        "INSERT INTO verification_steps (id, petition_id, title, description, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id.to_string(), petition_id, title, description, format_time(&timestamp)],
    )?;

    info!("Step '{}' recorded on petition {}", title, petition_id);

    Ok(VerificationStep {
        id,
        petition_id: petition,
        title: title.to_string(),
        description: description.to_string(),
        timestamp,
    })
}

fn map_step(row: &Row<'_>) -> rusqlite::Result<VerificationStep> {
    Ok(VerificationStep {
        id: uuid_col(row, 0)?,
        petition_id: uuid_col(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        timestamp: time_col(row, 4)?,
    })
}
