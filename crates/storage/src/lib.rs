use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{TierId, TierRecord};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Fully validated values for a new tier row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTier {
    pub level: u32,
    pub name: String,
    pub label: String,
    pub count_floor: f64,
}

/// Editable columns of an existing tier. Level is deliberately absent.
#[derive(Debug, Clone, PartialEq)]
pub struct TierUpdate {
    pub tier_id: TierId,
    pub name: String,
    pub label: String,
    pub count_floor: f64,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let max_connections = if is_in_memory(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_tiers(&self) -> Result<Vec<TierRecord>> {
        let rows = sqlx::query(
            "SELECT id, level, name, label, count_floor FROM tiers ORDER BY level ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list tiers")?;
        rows.iter().map(tier_from_row).collect()
    }

    pub async fn find_tier(&self, tier_id: TierId) -> Result<Option<TierRecord>> {
        let row = sqlx::query("SELECT id, level, name, label, count_floor FROM tiers WHERE id = ?")
            .bind(tier_id.0)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load tier {tier_id}"))?;
        row.as_ref().map(tier_from_row).transpose()
    }

    pub async fn insert_tier(&self, tier: &NewTier) -> Result<TierId> {
        let rec = sqlx::query(
            "INSERT INTO tiers (level, name, label, count_floor) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(i64::from(tier.level))
        .bind(&tier.name)
        .bind(&tier.label)
        .bind(tier.count_floor)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert tier at level {}", tier.level))?;
        Ok(TierId(rec.get::<i64, _>(0)))
    }

    /// Applies every update in one transaction; nothing is written if any
    /// row is missing. Submitted rows are parked under placeholder names
    /// first, so names may move between rows within one batch.
    pub async fn update_tiers(&self, updates: &[TierUpdate]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for update in updates {
            let result = sqlx::query("UPDATE tiers SET name = char(1) || 'tier-' || id WHERE id = ?")
                .bind(update.tier_id.0)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("failed to park name of tier {}", update.tier_id))?;
            if result.rows_affected() == 0 {
                anyhow::bail!("tier {} does not exist", update.tier_id);
            }
        }

        let mut touched = 0;
        for update in updates {
            let result = sqlx::query(
                "UPDATE tiers
                 SET name = ?, label = ?, count_floor = ?, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?",
            )
            .bind(&update.name)
            .bind(&update.label)
            .bind(update.count_floor)
            .bind(update.tier_id.0)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to update tier {}", update.tier_id))?;
            touched += result.rows_affected();
        }
        tx.commit().await.context("failed to commit tier updates")?;
        Ok(touched)
    }

    pub async fn delete_tier(&self, tier_id: TierId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tiers WHERE id = ?")
            .bind(tier_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete tier {tier_id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn tier_from_row(row: &SqliteRow) -> Result<TierRecord> {
    let level: i64 = row.try_get("level")?;
    Ok(TierRecord {
        id: Some(TierId(row.try_get("id")?)),
        level: u32::try_from(level).with_context(|| format!("stored level {level} out of range"))?,
        name: row.try_get("name")?,
        label: row.try_get("label")?,
        count_floor: Some(row.try_get("count_floor")?),
    })
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_in_memory(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
