use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_core::CompletionStore;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info};

use shared::domain::LevelId;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/progress.db";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelProgress {
    pub level_id: LevelId,
    pub completed_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url '{database_url}'"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open progress database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to migrate progress database")?;
        debug!(database_url, "progress database ready");
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn is_level_completed(&self, level_id: LevelId) -> Result<bool> {
        let completed: Option<i64> =
            sqlx::query_scalar("SELECT completed FROM level_progress WHERE level_id = ?")
                .bind(i64::from(level_id.0))
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("failed to read progress for level {level_id}"))?;
        Ok(completed.unwrap_or(0) != 0)
    }

    /// Sets the completion flag. Completing an already completed level keeps
    /// the original timestamp.
    pub async fn mark_level_completed(&self, level_id: LevelId) -> Result<()> {
        sqlx::query(
            "INSERT INTO level_progress (level_id, completed, completed_at) VALUES (?, 1, ?)
             ON CONFLICT(level_id) DO UPDATE SET
                completed_at = CASE WHEN completed = 1 THEN completed_at ELSE excluded.completed_at END,
                completed = 1",
        )
        .bind(i64::from(level_id.0))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store completion for level {level_id}"))?;
        info!(level_id = level_id.0, "level completion stored");
        Ok(())
    }

    pub async fn completed_levels(&self) -> Result<Vec<LevelProgress>> {
        let rows = sqlx::query(
            "SELECT level_id, completed_at FROM level_progress
             WHERE completed = 1 ORDER BY level_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list completed levels")?;

        rows.into_iter()
            .map(|row| -> Result<LevelProgress> {
                let raw_id: i64 = row.try_get("level_id")?;
                let level_id = u32::try_from(raw_id)
                    .with_context(|| format!("stored level id {raw_id} is out of range"))?;
                Ok(LevelProgress {
                    level_id: LevelId(level_id),
                    completed_at: row.try_get("completed_at")?,
                })
            })
            .collect()
    }

    /// Returns whether the level had been completed.
    pub async fn reset_level(&self, level_id: LevelId) -> Result<bool> {
        let result =
            sqlx::query("UPDATE level_progress SET completed = 0 WHERE level_id = ? AND completed = 1")
                .bind(i64::from(level_id.0))
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to reset level {level_id}"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns the number of levels that were reset.
    pub async fn reset_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM level_progress")
            .execute(&self.pool)
            .await
            .context("failed to reset progress")?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CompletionStore for Storage {
    async fn is_complete(&self, level_id: LevelId) -> Result<bool> {
        self.is_level_completed(level_id).await
    }

    async fn mark_complete(&self, level_id: LevelId) -> Result<()> {
        self.mark_level_completed(level_id).await
    }
}

/// Turns a plain file path or loosely written sqlite url into a sqlite url
/// and creates the parent directory of the database file.
pub fn prepare_database_url(raw_database_url: &str) -> Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return DEFAULT_DATABASE_URL.to_string();
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
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
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
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
