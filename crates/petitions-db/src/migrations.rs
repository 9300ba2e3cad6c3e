use rusqlite::Connection;
use tracing::info;

use crate::StoreResult;

/// Applies one versioned batch; the schema change and its version row commit
/// together or not at all.
fn apply(conn: &Connection, version: i64, sql: &str) -> StoreResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql)?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    tx.commit()?;
    Ok(())
}

pub fn run(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, petitions, verification steps)");
        apply(
            conn,
            1,
            "
            CREATE TABLE users (
                id                TEXT PRIMARY KEY,
                first_name        TEXT NOT NULL,
                last_name         TEXT NOT NULL,
                email             TEXT NOT NULL UNIQUE,
                phone             TEXT NOT NULL,
                national_id       TEXT NOT NULL UNIQUE,
                password_hash     TEXT NOT NULL,
                profile_pic_url   TEXT,
                role              TEXT NOT NULL DEFAULT 'petitioner',
                role_description  TEXT,
                created_at        TEXT NOT NULL,
                updated_at        TEXT NOT NULL
            );

            CREATE INDEX idx_users_role ON users(role);

            CREATE TABLE submitted_petitions (
                id                    TEXT PRIMARY KEY,
                submitted_by_user_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                petition_form_url     TEXT NOT NULL,
                subject_matter        TEXT NOT NULL,
                sources               TEXT NOT NULL DEFAULT '[]',
                status                TEXT NOT NULL DEFAULT 'PENDING',
                created_at            TEXT NOT NULL,
                updated_at            TEXT NOT NULL
            );

            CREATE INDEX idx_petitions_owner ON submitted_petitions(submitted_by_user_id);
            CREATE INDEX idx_petitions_status ON submitted_petitions(status);

            CREATE TABLE verification_steps (
                id           TEXT PRIMARY KEY,
                petition_id  TEXT NOT NULL REFERENCES submitted_petitions(id) ON DELETE CASCADE,
                title        TEXT NOT NULL,
                description  TEXT NOT NULL DEFAULT '',
                timestamp    TEXT NOT NULL
            );

            CREATE INDEX idx_steps_petition ON verification_steps(petition_id, timestamp);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (petition drafts)");
        apply(
            conn,
            2,
            "
            CREATE TABLE petition_drafts (
                id                 TEXT PRIMARY KEY,
                owner_user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                subject_matter     TEXT,
                petition_form_url  TEXT,
                sources            TEXT NOT NULL DEFAULT '[]',
                updated_at         TEXT NOT NULL
            );

            CREATE INDEX idx_drafts_owner ON petition_drafts(owner_user_id);
            ",
        )?;
    }

    if version < 3 {
        info!("Running migration v3 (petition form fields on drafts)");
        apply(
            conn,
            3,
            "
            ALTER TABLE petition_drafts ADD COLUMN petitioner_identification TEXT;
            ALTER TABLE petition_drafts ADD COLUMN grievances TEXT;
            ALTER TABLE petition_drafts ADD COLUMN prayer TEXT;
            ALTER TABLE petition_drafts ADD COLUMN prior_efforts_confirmation INTEGER NOT NULL DEFAULT 0;
            ALTER TABLE petition_drafts ADD COLUMN legal_status_confirmation INTEGER NOT NULL DEFAULT 0;
            ALTER TABLE petition_drafts ADD COLUMN petitioners TEXT NOT NULL DEFAULT '[]';
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
