use petitions_types::PetitionStatus;
use petitions_types::models::StatusChange;

use crate::petitions::set_status;
use crate::steps::insert_step;
use crate::{Database, StoreResult};

impl Database {
    /// Moves a petition to `status` and logs the matching verification step in
    /// one transaction. `title` defaults to the status label.
    pub fn record_status_change(
        &self,
        petition_id: &str,
        status: PetitionStatus,
        title: Option<&str>,
        note: &str,
    ) -> StoreResult<StatusChange> {
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(status.label());

        self.with_tx(|tx| {
            let petition = set_status(tx, petition_id, status)?;
            let step = insert_step(tx, petition_id, title, note)?;
            Ok(StatusChange { petition, step })
        })
    }
}
