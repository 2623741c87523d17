//! Friendship rows in the userdata store, looked up by username

use sqlx::postgres::PgConnection;
use tracing::debug;
use uuid::Uuid;

use crate::config::{Settings, Store};
use crate::db::{find_user_id, Database};
use crate::types::{FriendshipRecord, FriendshipStatus};
use crate::{Error, Result};

/// Queries against the userdata `friendship` table
#[derive(Debug, Clone)]
pub struct FriendshipService {
    db: Database,
}

impl FriendshipService {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            db: Database::new(settings, Store::Userdata)?,
        })
    }

    /// True once `addressee` has accepted `requester`'s invitation.
    ///
    /// Both usernames must resolve, otherwise `NotFound`.
    pub async fn friend_exists(&self, requester: &str, addressee: &str) -> Result<bool> {
        self.status_exists(requester, addressee, FriendshipStatus::Accepted)
            .await
    }

    /// True while `requester`'s invitation to `addressee` is pending
    pub async fn invitation_exists(&self, requester: &str, addressee: &str) -> Result<bool> {
        self.status_exists(requester, addressee, FriendshipStatus::Pending)
            .await
    }

    pub async fn get_friendship(&self, requester: &str, addressee: &str) -> Result<FriendshipRecord> {
        let mut conn = self.db.connect().await?;
        let (requester_id, addressee_id) = resolve_pair(&mut conn, requester, addressee).await?;
        sqlx::query_as::<_, FriendshipRecord>(
            "SELECT requester_id, addressee_id, status, created_date
             FROM friendship WHERE requester_id = $1 AND addressee_id = $2",
        )
        .bind(requester_id)
        .bind(addressee_id)
        .fetch_optional(&mut conn)
        .await?
        .ok_or_else(|| Error::not_found("friendship", format!("{requester} -> {addressee}")))
    }

    /// Friendships where the user is on either side
    pub async fn count_user_friendships(&self, username: &str) -> Result<i64> {
        let mut conn = self.db.connect().await?;
        let Some(id) = find_user_id(&mut conn, username).await? else {
            return Ok(0);
        };
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM friendship WHERE requester_id = $1 OR addressee_id = $1",
        )
        .bind(id)
        .fetch_one(&mut conn)
        .await?;
        Ok(count)
    }

    /// Delete friendships where the user is on either side; unknown user is a no-op
    pub async fn delete_user_friendships(&self, username: &str) -> Result<u64> {
        let mut conn = self.db.connect().await?;
        let Some(id) = find_user_id(&mut conn, username).await? else {
            return Ok(0);
        };
        let result = sqlx::query("DELETE FROM friendship WHERE requester_id = $1 OR addressee_id = $1")
            .bind(id)
            .execute(&mut conn)
            .await?;
        debug!("Deleted {} friendship(s) of {}", result.rows_affected(), username);
        Ok(result.rows_affected())
    }

    async fn status_exists(
        &self,
        requester: &str,
        addressee: &str,
        status: FriendshipStatus,
    ) -> Result<bool> {
        let mut conn = self.db.connect().await?;
        let (requester_id, addressee_id) = resolve_pair(&mut conn, requester, addressee).await?;
        let row = sqlx::query(
            "SELECT 1 FROM friendship
             WHERE requester_id = $1 AND addressee_id = $2 AND status = $3 LIMIT 1",
        )
        .bind(requester_id)
        .bind(addressee_id)
        .bind(status.as_str())
        .fetch_optional(&mut conn)
        .await?;
        Ok(row.is_some())
    }
}

async fn resolve_pair(
    conn: &mut PgConnection,
    requester: &str,
    addressee: &str,
) -> Result<(Uuid, Uuid)> {
    let requester_id = find_user_id(conn, requester)
        .await?
        .ok_or_else(|| Error::not_found("requester", requester))?;
    let addressee_id = find_user_id(conn, addressee)
        .await?
        .ok_or_else(|| Error::not_found("addressee", addressee))?;
    Ok((requester_id, addressee_id))
}
