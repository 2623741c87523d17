//! User rows in the userdata store

use tracing::debug;
use uuid::Uuid;

use crate::config::{Settings, Store};
use crate::db::{find_user_id, Database};
use crate::types::UserRecord;
use crate::{Error, Result};

/// Queries against the userdata `user` table
#[derive(Debug, Clone)]
pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            db: Database::new(settings, Store::Userdata)?,
        })
    }

    /// Existence check without fetching the row
    pub async fn user_exists(&self, username: &str) -> Result<bool> {
        let mut conn = self.db.connect().await?;
        let row = sqlx::query(r#"SELECT 1 FROM "user" WHERE username = $1 LIMIT 1"#)
            .bind(username)
            .fetch_optional(&mut conn)
            .await?;
        Ok(row.is_some())
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<UserRecord> {
        let mut conn = self.db.connect().await?;
        sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, username, currency, firstname, surname, full_name
               FROM "user" WHERE username = $1"#,
        )
        .bind(username)
        .fetch_optional(&mut conn)
        .await?
        .ok_or_else(|| Error::not_found("user", username))
    }

    pub async fn user_id(&self, username: &str) -> Result<Uuid> {
        let mut conn = self.db.connect().await?;
        find_user_id(&mut conn, username)
            .await?
            .ok_or_else(|| Error::not_found("user", username))
    }

    pub async fn count_users(&self) -> Result<i64> {
        let mut conn = self.db.connect().await?;
        let count = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "user""#)
            .fetch_one(&mut conn)
            .await?;
        Ok(count)
    }

    /// Delete the user row only; returns false when there was nothing to delete.
    ///
    /// Related rows are not touched, see `Cleanup::delete_user_cascade`.
    pub async fn delete_user(&self, username: &str) -> Result<bool> {
        let mut conn = self.db.connect().await?;
        let result = sqlx::query(r#"DELETE FROM "user" WHERE username = $1"#)
            .bind(username)
            .execute(&mut conn)
            .await?;
        debug!("Deleted {} userdata row(s) for {}", result.rows_affected(), username);
        Ok(result.rows_affected() > 0)
    }
}
