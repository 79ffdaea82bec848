//! Server-side record store on SQLite.
//!
//! Records are append-only: each accepted write inserts a new row and a
//! delete only stamps `deleted_at` on the live rows of a title. The newest
//! row of a title (highest `id`) is its current state.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::models::{Kind, Payload, Record, Snapshot};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("login '{0}' is already registered")]
    LoginTaken(String),
    #[error("stored payload for '{title}' is unreadable: {source}")]
    CorruptPayload {
        title: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored row has unknown kind '{0}'")]
    CorruptKind(String),
}

/// A registered account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
}

/// Current state of a title: its newest row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Head {
    pub version: u32,
    pub deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResult {
    /// Live rows were stamped deleted.
    Deleted,
    /// The title exists but was already deleted.
    AlreadyDeleted,
    /// No row was ever written for the title.
    Missing,
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    kind: String,
    title: String,
    payload: String,
    comment: Option<String>,
    version: i64,
    deleted_at: Option<String>,
}

#[derive(sqlx::FromRow)]
struct HeadRow {
    version: i64,
    deleted_at: Option<String>,
}

#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn create_user(
        &self,
        login: &str,
        password_hash: &str,
    ) -> Result<User, StorageError> {
        let created_at = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO users (login, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(login)
        .bind(password_hash)
        .bind(&created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(User {
                id: done.last_insert_rowid(),
                login: login.to_string(),
                password_hash: password_hash.to_string(),
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StorageError::LoginTaken(login.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_user(&self, login: &str) -> Result<Option<User>, StorageError> {
        let user = sqlx::query_as("SELECT id, login, password_hash FROM users WHERE login = ?")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn user_exists(&self, user_id: i64) -> Result<bool, StorageError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Version and delete state of the newest row for a title.
    pub async fn head(
        &self,
        user_id: i64,
        kind: Kind,
        title: &str,
    ) -> Result<Option<Head>, StorageError> {
        let row: Option<HeadRow> = sqlx::query_as(
            r#"
            SELECT version, deleted_at FROM records
            WHERE user_id = ? AND kind = ? AND title = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Head {
            version: clamp_version(row.version),
            deleted: row.deleted_at.is_some(),
        }))
    }

    /// Inserts a new live row for the record.
    pub async fn append(&self, user_id: i64, record: &Record) -> Result<(), StorageError> {
        let payload =
            serde_json::to_string(&record.payload).map_err(|source| StorageError::CorruptPayload {
                title: record.title.clone(),
                source,
            })?;
        let created_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO records (user_id, kind, title, payload, comment, version, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(record.kind().as_str())
        .bind(&record.title)
        .bind(&payload)
        .bind(&record.comment)
        .bind(i64::from(record.version))
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The current record for a title, unless it is deleted or missing.
    pub async fn latest(
        &self,
        user_id: i64,
        kind: Kind,
        title: &str,
    ) -> Result<Option<Record>, StorageError> {
        let row: Option<RecordRow> = sqlx::query_as(
            r#"
            SELECT kind, title, payload, comment, version, deleted_at FROM records
            WHERE user_id = ? AND kind = ? AND title = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) if row.deleted_at.is_none() => hydrate(row).map(Some),
            _ => Ok(None),
        }
    }

    pub async fn soft_delete(
        &self,
        user_id: i64,
        kind: Kind,
        title: &str,
    ) -> Result<DeleteResult, StorageError> {
        let deleted_at = Utc::now().to_rfc3339();

        let done = sqlx::query(
            r#"
            UPDATE records SET deleted_at = ?
            WHERE user_id = ? AND kind = ? AND title = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&deleted_at)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(title)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() > 0 {
            return Ok(DeleteResult::Deleted);
        }

        match self.head(user_id, kind, title).await? {
            Some(_) => Ok(DeleteResult::AlreadyDeleted),
            None => Ok(DeleteResult::Missing),
        }
    }

    /// The newest live row of every title the user holds, across all kinds.
    pub async fn snapshot(&self, user_id: i64) -> Result<Snapshot, StorageError> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT r.kind, r.title, r.payload, r.comment, r.version, r.deleted_at
            FROM records r
            WHERE r.user_id = ?
              AND r.deleted_at IS NULL
              AND r.id = (
                  SELECT MAX(id) FROM records
                  WHERE user_id = r.user_id AND kind = r.kind AND title = r.title
              )
            ORDER BY r.kind, r.title
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut snapshot = Snapshot::default();
        for row in rows {
            snapshot.push(hydrate(row)?);
        }
        Ok(snapshot)
    }
}

fn clamp_version(version: i64) -> u32 {
    u32::try_from(version).unwrap_or(u32::MAX)
}

fn hydrate(row: RecordRow) -> Result<Record, StorageError> {
    let kind = Kind::from_str(&row.kind).map_err(|_| StorageError::CorruptKind(row.kind.clone()))?;
    let payload: Payload =
        serde_json::from_str(&row.payload).map_err(|source| StorageError::CorruptPayload {
            title: row.title.clone(),
            source,
        })?;
    if payload.kind() != kind {
        return Err(StorageError::CorruptKind(row.kind));
    }

    Ok(Record {
        title: row.title,
        payload,
        comment: row.comment,
        version: clamp_version(row.version),
        deleted_at: row.deleted_at.and_then(|ts| {
            DateTime::parse_from_rfc3339(&ts)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }),
    })
}
