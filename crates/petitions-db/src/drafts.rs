use std::sync::OnceLock;

use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{info, warn};
use uuid::Uuid;

use petitions_types::models::{CoPetitioner, Petition, PetitionDraft};

use crate::models::{DraftContents, NewCoPetitioner, NewPetition, format_time, json_col, now, time_col, uuid_col};
use crate::petitions::insert_petition;
use crate::users::user_exists;
use crate::{Database, StoreError, StoreResult};

const DRAFT_COLUMNS: &str = "id, owner_user_id, subject_matter, petition_form_url, sources, updated_at, \
     petitioner_identification, grievances, prayer, prior_efforts_confirmation, \
     legal_status_confirmation, petitioners";

impl Database {
    /// Creates or replaces the owner's draft. A draft id already used by
    /// another account is a conflict.
    pub fn save_draft(&self, owner_id: &str, draft_id: Uuid, contents: &DraftContents) -> StoreResult<PetitionDraft> {
        let owner: Uuid = owner_id
            .parse()
            .map_err(|_| StoreError::validation("owner id is not a valid id"))?;
        for petitioner in &contents.petitioners {
            validate_co_petitioner(&petitioner.name, &petitioner.address, &petitioner.phone, &petitioner.national_id)?;
        }

        let updated_at = now();
        let sources_json = serde_json::to_string(&contents.sources)?;
        let petitioners_json = serde_json::to_string(&contents.petitioners)?;

        self.with_conn(|conn| {
            if !user_exists(conn, owner_id)? {
                return Err(StoreError::NotFound("user"));
            }

            let written = conn.execute(
                "INSERT INTO petition_drafts
                     (id, owner_user_id, subject_matter, petition_form_url, sources, updated_at,
                      petitioner_identification, grievances, prayer, prior_efforts_confirmation,
                      legal_status_confirmation, petitioners)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                     subject_matter = excluded.subject_matter,
                     petition_form_url = excluded.petition_form_url,
                     sources = excluded.sources,
                     updated_at = excluded.updated_at,
                     petitioner_identification = excluded.petitioner_identification,
                     grievances = excluded.grievances,
                     prayer = excluded.prayer,
                     prior_efforts_confirmation = excluded.prior_efforts_confirmation,
                     legal_status_confirmation = excluded.legal_status_confirmation,
                     petitioners = excluded.petitioners
                 WHERE petition_drafts.owner_user_id = excluded.owner_user_id",
                params![
                    draft_id.to_string(),
                    owner_id,
                    contents.subject_matter,
                    contents.petition_form_url,
                    sources_json,
                    format_time(&updated_at),
                    contents.petitioner_identification,
                    contents.grievances,
                    contents.prayer,
                    contents.prior_efforts_confirmation,
                    contents.legal_status_confirmation,
                    petitioners_json,
                ],
            )?;
            if written == 0 {
                return Err(StoreError::Conflict("draft id is already in use".into()));
            }
            Ok(())
        })?;

        Ok(PetitionDraft {
            id: draft_id,
            owner_user_id: owner,
            subject_matter: contents.subject_matter.clone(),
            petition_form_url: contents.petition_form_url.clone(),
            sources: contents.sources.clone(),
            petitioner_identification: contents.petitioner_identification.clone(),
            grievances: contents.grievances.clone(),
            prayer: contents.prayer.clone(),
            prior_efforts_confirmation: contents.prior_efforts_confirmation,
            legal_status_confirmation: contents.legal_status_confirmation,
            petitioners: contents.petitioners.clone(),
            updated_at,
        })
    }

    /// Drafts owned by someone else look exactly like missing ones.
    pub fn load_draft(&self, owner_id: &str, draft_id: Uuid) -> StoreResult<PetitionDraft> {
        self.with_conn(|conn| query_draft(conn, owner_id, draft_id))?
            .ok_or(StoreError::NotFound("draft"))
    }

    pub fn delete_draft(&self, owner_id: &str, draft_id: Uuid) -> StoreResult<()> {
        let deleted = self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM petition_drafts WHERE id = ?1 AND owner_user_id = ?2",
                params![draft_id.to_string(), owner_id],
            )?)
        })?;
        if deleted == 0 {
            return Err(StoreError::NotFound("draft"));
        }
        Ok(())
    }

    /// Appends a validated co-petitioner under a fresh id.
    pub fn add_co_petitioner(
        &self,
        owner_id: &str,
        draft_id: Uuid,
        new: &NewCoPetitioner,
    ) -> StoreResult<PetitionDraft> {
        validate_co_petitioner(&new.name, &new.address, &new.phone, &new.national_id)?;

        let petitioner = CoPetitioner {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            address: new.address.trim().to_string(),
            phone: new.phone.trim().to_string(),
            national_id: new.national_id.trim().to_string(),
        };

        self.with_tx(|tx| {
            let mut draft = query_draft(tx, owner_id, draft_id)?.ok_or(StoreError::NotFound("draft"))?;
            draft.petitioners.push(petitioner);
            store_petitioners(tx, &mut draft)?;
            Ok(draft)
        })
    }

    pub fn remove_co_petitioner(&self, owner_id: &str, draft_id: Uuid, petitioner_id: Uuid) -> StoreResult<PetitionDraft> {
        self.with_tx(|tx| {
            let mut draft = query_draft(tx, owner_id, draft_id)?.ok_or(StoreError::NotFound("draft"))?;
            let before = draft.petitioners.len();
            draft.petitioners.retain(|p| p.id != petitioner_id);
            if draft.petitioners.len() == before {
                return Err(StoreError::NotFound("co-petitioner"));
            }
            store_petitioners(tx, &mut draft)?;
            Ok(draft)
        })
    }

    /// Turns a complete draft into a submitted petition and discards the draft.
    pub fn submit_draft(&self, owner_id: &str, draft_id: Uuid) -> StoreResult<Petition> {
        let petition = self.with_tx(|tx| {
            let draft = query_draft(tx, owner_id, draft_id)?.ok_or(StoreError::NotFound("draft"))?;

            let petition = insert_petition(
                tx,
                &NewPetition {
                    owner_id: owner_id.to_string(),
                    petition_form_url: draft.petition_form_url.unwrap_or_default(),
                    subject_matter: draft.subject_matter.unwrap_or_default(),
                    sources: draft.sources,
                },
            )?;

            tx.execute("DELETE FROM petition_drafts WHERE id = ?1", [draft_id.to_string()])?;
            Ok(petition)
        })?;

        info!("Draft {} submitted as petition {}", draft_id, petition.id);
        Ok(petition)
    }
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?[0-9\s\-()]{7,}$").expect("phone pattern compiles"))
}

/// Field rules of the petition form's co-petitioner entry.
fn validate_co_petitioner(name: &str, address: &str, phone: &str, national_id: &str) -> StoreResult<()> {
    let problem = if name.trim().chars().count() < 2 {
        Some("name must be at least 2 characters")
    } else if address.trim().chars().count() < 10 {
        Some("address must be at least 10 characters")
    } else if !phone_pattern().is_match(phone.trim()) {
        Some("phone number is not valid")
    } else if national_id.trim().chars().count() < 5 {
        Some("ID/passport number must be at least 5 characters")
    } else {
        None
    };

    match problem {
        Some(message) => {
            warn!("Co-petitioner rejected: {}", message);
            Err(StoreError::validation(format!("co-petitioner {message}")))
        }
        None => Ok(()),
    }
}

fn store_petitioners(conn: &Connection, draft: &mut PetitionDraft) -> StoreResult<()> {
    draft.updated_at = now();
    conn.execute(
        "UPDATE petition_drafts SET petitioners = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            serde_json::to_string(&draft.petitioners)?,
            format_time(&draft.updated_at),
            draft.id.to_string(),
        ],
    )?;
    Ok(())
}

fn query_draft(conn: &Connection, owner_id: &str, draft_id: Uuid) -> StoreResult<Option<PetitionDraft>> {
    let sql = format!("SELECT {DRAFT_COLUMNS} FROM petition_drafts WHERE id = ?1 AND owner_user_id = ?2");
    let draft = conn
        .query_row(&sql, params![draft_id.to_string(), owner_id], map_draft)
        .optional()?;
    Ok(draft)
}

fn map_draft(row: &Row<'_>) -> rusqlite::Result<PetitionDraft> {
    Ok(PetitionDraft {
        id: uuid_col(row, 0)?,
        owner_user_id: uuid_col(row, 1)?,
        subject_matter: row.get(2)?,
        petition_form_url: row.get(3)?,
        sources: json_col(row, 4)?,
        updated_at: time_col(row, 5)?,
        petitioner_identification: row.get(6)?,
        grievances: row.get(7)?,
        prayer: row.get(8)?,
        prior_efforts_confirmation: row.get(9)?,
        legal_status_confirmation: row.get(10)?,
        petitioners: json_col(row, 11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{db, user};
    use petitions_types::PetitionStatus;
    use petitions_types::models::SourceDocument;

    fn evidence() -> Vec<SourceDocument> {
        vec![SourceDocument {
            id: "s1".into(),
            url: "https://x/photo.jpg".into(),
            file_name: None,
        }]
    }

    fn contents(subject: &str, form_url: Option<&str>) -> DraftContents {
        DraftContents {
            subject_matter: Some(subject.into()),
            petition_form_url: form_url.map(str::to_string),
            ..Default::default()
        }
    }

    fn co_petitioner() -> NewCoPetitioner {
        NewCoPetitioner {
            name: "John Mwangi".into(),
            address: "12 Moi Avenue, Nairobi".into(),
            phone: "+254 (700) 123-456".into(),
            national_id: "A1234567".into(),
        }
    }

    #[test]
    fn save_then_load() {
        let db = db();
        let owner = user(&db, "a@x.com", "ID1").id.to_string();
        let draft_id = Uuid::new_v4();

        db.save_draft(&owner, draft_id, &contents("Roads", None)).unwrap();
        let saved = db
            .save_draft(
                &owner,
                draft_id,
                &DraftContents {
                    sources: evidence(),
                    grievances: Some("Potholes on the county road".into()),
                    prayer: Some("Resurface the road".into()),
                    prior_efforts_confirmation: true,
                    ..contents("Roads and bridges", Some("https://x/form.pdf"))
                },
            )
            .unwrap();

        assert_eq!(db.load_draft(&owner, draft_id).unwrap(), saved);
        assert_eq!(saved.subject_matter.as_deref(), Some("Roads and bridges"));
        assert!(saved.prior_efforts_confirmation);
        assert!(!saved.legal_status_confirmation);
    }

    #[test]
    fn drafts_are_private_to_their_owner() {
        let db = db();
        let owner = user(&db, "a@x.com", "ID1").id.to_string();
        let intruder = user(&db, "b@x.com", "ID2").id.to_string();
        let draft_id = Uuid::new_v4();
        db.save_draft(&owner, draft_id, &contents("Roads", None)).unwrap();

        assert!(matches!(db.load_draft(&intruder, draft_id), Err(StoreError::NotFound("draft"))));
        assert!(matches!(db.delete_draft(&intruder, draft_id), Err(StoreError::NotFound("draft"))));
        assert!(matches!(
            db.save_draft(&intruder, draft_id, &contents("Mine now", None)),
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            db.add_co_petitioner(&intruder, draft_id, &co_petitioner()),
            Err(StoreError::NotFound("draft"))
        ));
        assert_eq!(db.load_draft(&owner, draft_id).unwrap().subject_matter.as_deref(), Some("Roads"));
    }

    #[test]
    fn co_petitioners_are_added_and_removed() {
        let db = db();
        let owner = user(&db, "a@x.com", "ID1").id.to_string();
        let draft_id = Uuid::new_v4();
        db.save_draft(&owner, draft_id, &contents("Water", None)).unwrap();

        let draft = db.add_co_petitioner(&owner, draft_id, &co_petitioner()).unwrap();
        assert_eq!(draft.petitioners.len(), 1);
        let added = draft.petitioners[0].clone();
        assert_eq!(added.name, "John Mwangi");
        assert_eq!(db.load_draft(&owner, draft_id).unwrap().petitioners, vec![added.clone()]);

        let draft = db.remove_co_petitioner(&owner, draft_id, added.id).unwrap();
        assert!(draft.petitioners.is_empty());
        assert!(matches!(
            db.remove_co_petitioner(&owner, draft_id, added.id),
            Err(StoreError::NotFound("co-petitioner"))
        ));
    }

    #[test]
    fn co_petitioner_fields_are_validated() {
        let db = db();
        let owner = user(&db, "a@x.com", "ID1").id.to_string();
        let draft_id = Uuid::new_v4();
        db.save_draft(&owner, draft_id, &contents("Water", None)).unwrap();

        let cases = [
            NewCoPetitioner { name: "J".into(), ..co_petitioner() },
            NewCoPetitioner { address: "Nairobi".into(), ..co_petitioner() },
            NewCoPetitioner { phone: "call me".into(), ..co_petitioner() },
            NewCoPetitioner { phone: "12345".into(), ..co_petitioner() },
            NewCoPetitioner { national_id: "A12".into(), ..co_petitioner() },
        ];
        for bad in &cases {
            let err = db.add_co_petitioner(&owner, draft_id, bad).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{bad:?}");
        }
        assert!(db.load_draft(&owner, draft_id).unwrap().petitioners.is_empty());

        let invalid_list = DraftContents {
            petitioners: vec![CoPetitioner {
                id: Uuid::new_v4(),
                name: "John Mwangi".into(),
                address: "short".into(),
                phone: "0700123456".into(),
                national_id: "A1234567".into(),
            }],
            ..contents("Water", None)
        };
        assert!(matches!(
            db.save_draft(&owner, draft_id, &invalid_list),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn submit_draft_creates_petition_and_discards_draft() {
        let db = db();
        let owner = user(&db, "a@x.com", "ID1").id.to_string();
        let draft_id = Uuid::new_v4();
        db.save_draft(
            &owner,
            draft_id,
            &DraftContents {
                sources: evidence(),
                ..contents("Roads", Some("https://x/form.pdf"))
            },
        )
        .unwrap();

        let petition = db.submit_draft(&owner, draft_id).unwrap();
        assert_eq!(petition.status, PetitionStatus::Pending);
        assert_eq!(petition.sources, evidence());
        assert!(matches!(db.load_draft(&owner, draft_id), Err(StoreError::NotFound(_))));
        assert_eq!(db.list_petitions_by_owner(&owner).unwrap().len(), 1);
    }

    #[test]
    fn incomplete_draft_stays_put() {
        let db = db();
        let owner = user(&db, "a@x.com", "ID1").id.to_string();
        let draft_id = Uuid::new_v4();
        db.save_draft(&owner, draft_id, &contents("Roads", None)).unwrap();

        assert!(matches!(db.submit_draft(&owner, draft_id), Err(StoreError::Validation(_))));
        assert!(db.load_draft(&owner, draft_id).is_ok());
        assert!(db.list_petitions_by_owner(&owner).unwrap().is_empty());
    }

    #[test]
    fn deleting_the_owner_removes_their_drafts() {
        let db = db();
        let owner = user(&db, "a@x.com", "ID1").id.to_string();
        let other = user(&db, "b@x.com", "ID2").id.to_string();
        let (mine, theirs) = (Uuid::new_v4(), Uuid::new_v4());
        db.save_draft(&owner, mine, &contents("Roads", None)).unwrap();
        db.save_draft(&other, theirs, &contents("Water", None)).unwrap();

        db.delete_user(&owner).unwrap();

        let remaining: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM petition_drafts", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(remaining, 1);
        assert!(db.load_draft(&other, theirs).is_ok());
    }
}
