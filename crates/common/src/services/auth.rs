//! Credentials in the auth store
//!
//! Authorities reference users, so deletes remove them first.

use tracing::debug;

use crate::config::{Settings, Store};
use crate::db::{find_user_id, Database};
use crate::types::AuthUserRecord;
use crate::{Error, Result};

/// Queries against the auth store (`user` and `authority` tables)
#[derive(Debug, Clone)]
pub struct AuthService {
    db: Database,
}

impl AuthService {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            db: Database::new(settings, Store::Auth)?,
        })
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool> {
        let mut conn = self.db.connect().await?;
        Ok(find_user_id(&mut conn, username).await?.is_some())
    }

    pub async fn get_user(&self, username: &str) -> Result<AuthUserRecord> {
        let mut conn = self.db.connect().await?;
        sqlx::query_as::<_, AuthUserRecord>(
            r#"SELECT id, username, enabled FROM "user" WHERE username = $1"#,
        )
        .bind(username)
        .fetch_optional(&mut conn)
        .await?
        .ok_or_else(|| Error::not_found("auth user", username))
    }

    /// Delete authorities, then the credentials row; absent user is a no-op
    pub async fn delete_user(&self, username: &str) -> Result<bool> {
        let mut conn = self.db.connect().await?;
        let Some(id) = find_user_id(&mut conn, username).await? else {
            return Ok(false);
        };

        let authorities = sqlx::query("DELETE FROM authority WHERE user_id = $1")
            .bind(id)
            .execute(&mut conn)
            .await?;
        let user = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
            .bind(id)
            .execute(&mut conn)
            .await?;

        debug!(
            "Deleted auth user {} with {} authorit(ies)",
            username,
            authorities.rows_affected()
        );
        Ok(user.rows_affected() > 0)
    }
}
