//! Spends and categories in the spend store

use tracing::debug;
use uuid::Uuid;

use crate::config::{Settings, Store};
use crate::db::Database;
use crate::types::{CategoryRecord, SpendRecord};
use crate::{Error, Result};

/// Queries against the spend store (`spend` and `category` tables)
#[derive(Debug, Clone)]
pub struct SpendService {
    db: Database,
}

impl SpendService {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            db: Database::new(settings, Store::Spend)?,
        })
    }

    /// Existence check without fetching the row
    pub async fn spend_exists(&self, spend_id: Uuid) -> Result<bool> {
        let mut conn = self.db.connect().await?;
        let row = sqlx::query("SELECT 1 FROM spend WHERE id = $1 LIMIT 1")
            .bind(spend_id)
            .fetch_optional(&mut conn)
            .await?;
        Ok(row.is_some())
    }

    pub async fn get_spend(&self, spend_id: Uuid) -> Result<SpendRecord> {
        let mut conn = self.db.connect().await?;
        sqlx::query_as::<_, SpendRecord>(
            "SELECT id, username, spend_date, currency, amount, description, category_id
             FROM spend WHERE id = $1",
        )
        .bind(spend_id)
        .fetch_optional(&mut conn)
        .await?
        .ok_or_else(|| Error::not_found("spend", spend_id.to_string()))
    }

    pub async fn get_user_spend_count(&self, username: &str) -> Result<i64> {
        let mut conn = self.db.connect().await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM spend WHERE username = $1")
            .bind(username)
            .fetch_one(&mut conn)
            .await?;
        Ok(count)
    }

    pub async fn get_user_spends(&self, username: &str) -> Result<Vec<SpendRecord>> {
        let mut conn = self.db.connect().await?;
        let spends = sqlx::query_as::<_, SpendRecord>(
            "SELECT id, username, spend_date, currency, amount, description, category_id
             FROM spend WHERE username = $1 ORDER BY spend_date DESC",
        )
        .bind(username)
        .fetch_all(&mut conn)
        .await?;
        Ok(spends)
    }

    /// Returns false when the spend did not exist
    pub async fn delete_spend(&self, spend_id: Uuid) -> Result<bool> {
        let mut conn = self.db.connect().await?;
        let result = sqlx::query("DELETE FROM spend WHERE id = $1")
            .bind(spend_id)
            .execute(&mut conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_user_spends(&self, username: &str) -> Result<u64> {
        let mut conn = self.db.connect().await?;
        let result = sqlx::query("DELETE FROM spend WHERE username = $1")
            .bind(username)
            .execute(&mut conn)
            .await?;
        debug!("Deleted {} spend(s) of {}", result.rows_affected(), username);
        Ok(result.rows_affected())
    }

    pub async fn category_exists(&self, username: &str, name: &str) -> Result<bool> {
        let mut conn = self.db.connect().await?;
        let row = sqlx::query("SELECT 1 FROM category WHERE username = $1 AND name = $2 LIMIT 1")
            .bind(username)
            .bind(name)
            .fetch_optional(&mut conn)
            .await?;
        Ok(row.is_some())
    }

    pub async fn get_user_categories(&self, username: &str) -> Result<Vec<CategoryRecord>> {
        let mut conn = self.db.connect().await?;
        let categories = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, username, archived FROM category WHERE username = $1 ORDER BY name",
        )
        .bind(username)
        .fetch_all(&mut conn)
        .await?;
        Ok(categories)
    }

    /// Spends reference categories, so delete those first
    pub async fn delete_user_categories(&self, username: &str) -> Result<u64> {
        let mut conn = self.db.connect().await?;
        let result = sqlx::query("DELETE FROM category WHERE username = $1")
            .bind(username)
            .execute(&mut conn)
            .await?;
        debug!("Deleted {} categor(ies) of {}", result.rows_affected(), username);
        Ok(result.rows_affected())
    }
}
