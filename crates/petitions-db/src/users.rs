use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;
use uuid::Uuid;

use petitions_types::Role;
use petitions_types::models::User;

use crate::models::{NewUser, UserChanges, format_time, non_blank, now, role_col, time_col, uuid_col};
use crate::{Database, StoreError, StoreResult};

const USER_COLUMNS: &str = "id, first_name, last_name, email, phone, national_id, profile_pic_url, \
     role, role_description, created_at, updated_at";

/// A user together with the stored hash, for credential checks only.
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

impl Database {
    pub fn create_user(&self, new: &NewUser) -> StoreResult<User> {
        let first_name = required(&new.first_name, "first name")?;
        let last_name = required(&new.last_name, "last name")?;
        let email = required(&new.email, "email")?;
        let phone = required(&new.phone, "phone")?;
        let national_id = required(&new.national_id, "national id")?;

        let id = Uuid::new_v4();
        let created_at = now();
        let stamp = format_time(&created_at);

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, first_name, last_name, email, phone, national_id, password_hash,
                                    profile_pic_url, role, role_description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    id.to_string(),
                    first_name,
                    last_name,
                    email,
                    phone,
                    national_id,
                    &new.password_hash,
                    &new.profile_pic_url,
                    new.role.as_str(),
                    &new.role_description,
                    &stamp,
                ],
            )?;
            Ok(())
        })?;

        info!("User {} registered with role {}", id, new.role);

        Ok(User {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            national_id: national_id.to_string(),
            profile_pic_url: new.profile_pic_url.clone(),
            role: new.role,
            role_description: new.role_description.clone(),
            created_at,
            updated_at: created_at,
        })
    }

    pub fn get_user(&self, id: &str) -> StoreResult<User> {
        self.with_conn(|conn| query_user(conn, id))?
            .ok_or(StoreError::NotFound("user"))
    }

    pub fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.get_credentials(email)?.map(|c| c.user))
    }

    /// Exact email match, hash included.
    pub fn get_credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1");
            let creds = conn
                .query_row(&sql, [email], |row| {
                    Ok(Credentials {
                        user: map_user(row)?,
                        password_hash: row.get(11)?,
                    })
                })
                .optional()?;
            Ok(creds)
        })
    }

    /// Case-insensitive on the role token. Blank input returns no users
    /// without touching the database.
    pub fn list_users_by_role(&self, role: &str) -> StoreResult<Vec<User>> {
        if role.trim().is_empty() {
            return Ok(vec![]);
        }
        let role: Role = role
            .parse()
            .map_err(|e: petitions_types::roles::UnknownRole| StoreError::validation(e.to_string()))?;

        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let users = stmt
                .query_map([role.as_str()], map_user)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
    }

    pub fn list_users(&self) -> StoreResult<Vec<User>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at");
            let mut stmt = conn.prepare(&sql)?;
            let users = stmt
                .query_map([], map_user)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
    }

    /// Applies the provided fields and stamps `updated_at`.
    pub fn update_user(&self, id: &str, changes: &UserChanges) -> StoreResult<User> {
        let mut sets: Vec<&'static str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        let text_fields: [(&'static str, &'static str, &Option<String>); 6] = [
            ("first_name = ?", "first name", &changes.first_name),
            ("last_name = ?", "last name", &changes.last_name),
            ("email = ?", "email", &changes.email),
            ("phone = ?", "phone", &changes.phone),
            ("national_id = ?", "national id", &changes.national_id),
            ("password_hash = ?", "password", &changes.password_hash),
        ];
        for (set, name, value) in text_fields {
            if let Some(value) = value {
                sets.push(set);
                values.push(required(value, name)?.to_string());
            }
        }
        if let Some(url) = &changes.profile_pic_url {
            sets.push("profile_pic_url = ?");
            values.push(url.clone());
        }
        if let Some(role) = changes.role {
            sets.push("role = ?");
            values.push(role.as_str().to_string());
        }
        if let Some(description) = &changes.role_description {
            sets.push("role_description = ?");
            values.push(description.clone());
        }

        sets.push("updated_at = ?");
        values.push(format_time(&now()));
        values.push(id.to_string());

        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));

        self.with_conn(|conn| {
            let changed = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
            if changed == 0 {
                return Err(StoreError::NotFound("user"));
            }
            query_user(conn, id)?.ok_or(StoreError::NotFound("user"))
        })
    }

    /// Deletes the account; petitions, their steps and drafts cascade.
    pub fn delete_user(&self, id: &str) -> StoreResult<()> {
        let deleted = self.with_conn(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])?))?;
        if deleted == 0 {
            return Err(StoreError::NotFound("user"));
        }
        info!("User {} deleted", id);
        Ok(())
    }
}

fn required<'a>(value: &'a str, field: &str) -> StoreResult<&'a str> {
    non_blank(value).ok_or_else(|| StoreError::validation(format!("{field} is required")))
}

pub(crate) fn user_exists(conn: &Connection, id: &str) -> StoreResult<bool> {
    let found = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn query_user(conn: &Connection, id: &str) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let user = conn.query_row(&sql, [id], map_user).optional()?;
    Ok(user)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_col(row, 0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        national_id: row.get(5)?,
        profile_pic_url: row.get(6)?,
        role: role_col(row, 7)?,
        role_description: row.get(8)?,
        created_at: time_col(row, 9)?,
        updated_at: time_col(row, 10)?,
    })
}
