//! Admission control for record writes.
//!
//! Versions are assigned by clients, so the server only gates on ordering:
//! a write must carry a version newer than the one stored for its title,
//! unless the stored title is deleted. The check and the append run under
//! a per-title lock so two writers cannot both pass against the same head.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::Mutex;

use super::storage::{DeleteResult, Head, RecordStore, StorageError};
use crate::api::CONFLICT_MESSAGE;
use crate::models::{Kind, Payload, Record};

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("{0}")]
    Invalid(String),
    #[error("{} (stored {stored}, incoming {incoming})", CONFLICT_MESSAGE)]
    Conflict { stored: u32, incoming: u32 },
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why a write was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    FirstWrite,
    /// The stored title was deleted; its version no longer blocks writes.
    Revive,
    NewerVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept(Accept),
    Reject { stored: u32 },
}

/// Checks that a record carries everything its kind requires.
pub fn validate(record: &Record) -> Result<(), GuardError> {
    if record.title.trim().is_empty() {
        return Err(GuardError::Invalid("title is required".to_string()));
    }

    let missing = match &record.payload {
        Payload::Pair { login, .. } if login.is_empty() => Some("login"),
        Payload::Text { body } if body.is_empty() => Some("body"),
        Payload::Bin { body } if body.is_empty() => Some("body"),
        Payload::Card { number, .. } if number.is_empty() => Some("number"),
        Payload::Card { expdate, .. } if expdate.is_empty() => Some("expdate"),
        _ => None,
    };

    match missing {
        Some(field) => Err(GuardError::Invalid(format!(
            "{} record requires a non-empty {}",
            record.kind(),
            field
        ))),
        None => Ok(()),
    }
}

/// Decides a write against the current head of its title.
pub fn admit(head: Option<Head>, incoming: u32) -> Admission {
    match head {
        None => Admission::Accept(Accept::FirstWrite),
        Some(head) if head.deleted => Admission::Accept(Accept::Revive),
        Some(head) if incoming <= head.version => Admission::Reject {
            stored: head.version,
        },
        Some(_) => Admission::Accept(Accept::NewerVersion),
    }
}

type Key = (i64, Kind, String);
type LockTable = StdMutex<HashMap<Key, Arc<Mutex<()>>>>;

pub struct WriteGuard {
    store: RecordStore,
    /// One lock per (user, kind, title) with a write in flight.
    locks: LockTable,
}

/// A claim on one key's lock. Dropping it, including when the owning
/// future is cancelled, removes the table entry if nobody else holds a claim.
struct KeyLease<'a> {
    table: &'a LockTable,
    key: Key,
    lock: Arc<Mutex<()>>,
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table, one here: no other task holds or waits.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}

impl WriteGuard {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Validates, admits and appends a write.
    pub async fn write(&self, user_id: i64, record: &Record) -> Result<Accept, GuardError> {
        validate(record)?;

        let lease = self.lease((user_id, record.kind(), record.title.clone()));
        let _held = lease.lock.lock().await;
        self.admit_and_append(user_id, record).await
    }

    /// Soft-deletes a title. Deleting an already deleted title succeeds.
    pub async fn delete(&self, user_id: i64, kind: Kind, title: &str) -> Result<(), GuardError> {
        let result = {
            let lease = self.lease((user_id, kind, title.to_string()));
            let _held = lease.lock.lock().await;
            self.store.soft_delete(user_id, kind, title).await
        };

        match result? {
            DeleteResult::Deleted | DeleteResult::AlreadyDeleted => Ok(()),
            DeleteResult::Missing => Err(GuardError::NotFound),
        }
    }

    async fn admit_and_append(&self, user_id: i64, record: &Record) -> Result<Accept, GuardError> {
        let head = self.store.head(user_id, record.kind(), &record.title).await?;

        match admit(head, record.version) {
            Admission::Accept(reason) => {
                self.store.append(user_id, record).await?;
                tracing::debug!(
                    "Accepted {} '{}' v{} ({:?})",
                    record.kind(),
                    record.title,
                    record.version,
                    reason
                );
                Ok(reason)
            }
            Admission::Reject { stored } => {
                tracing::debug!(
                    "Rejected {} '{}' v{}: stored v{}",
                    record.kind(),
                    record.title,
                    record.version,
                    stored
                );
                Err(GuardError::Conflict {
                    stored,
                    incoming: record.version,
                })
            }
        }
    }

    fn lease(&self, key: Key) -> KeyLease<'_> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        KeyLease {
            table: &self.locks,
            key,
            lock,
        }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
