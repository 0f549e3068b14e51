//! The async repository facade over one storage accessor.
//!
//! This is the only surface presentation code calls. Every one-shot
//! operation is a suspension point: the blocking SQLite work runs on the
//! tokio blocking pool so a UI-driving task is never frozen on I/O. The
//! facade holds no entity state of its own; the accessor owns everything
//! durable.
//!
//! Insert-or-update policy lives here and nowhere else: an entity whose
//! identity is the zero sentinel is inserted, anything else is updated,
//! and callers never need to know which happened.

use std::sync::Arc;

use tokio::sync::watch;

use atelier_core::error::{AtelierError, Result};
use atelier_core::types::UNSAVED_ID;

use crate::dao::SqliteDao;
use crate::db::Database;
use crate::record::Record;

/// Async repository for one entity collection.
#[derive(Clone)]
pub struct Repository<R: Record> {
    dao: Arc<SqliteDao<R>>,
}

impl<R: Record> Repository<R> {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            dao: Arc::new(SqliteDao::new(db)),
        }
    }

    /// Run one accessor call on the blocking pool.
    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&SqliteDao<R>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let dao = Arc::clone(&self.dao);
        tokio::task::spawn_blocking(move || f(&dao))
            .await
            .map_err(|e| AtelierError::Storage(format!("{} task failed: {}", op, e)))?
    }

    /// Persist a new record; returns the storage-assigned identity.
    pub async fn insert(&self, entity: R) -> Result<i64> {
        self.run("insert", move |dao| dao.insert(&entity)).await
    }

    /// Overwrite the persisted record with the entity's identity.
    ///
    /// Rejects unsaved entities before the accessor is reached; there is
    /// nothing in storage an id-0 update could address.
    pub async fn update(&self, entity: R) -> Result<()> {
        if entity.id() == UNSAVED_ID {
            return Err(AtelierError::InvalidArgument(
                "cannot update an unsaved record (id 0); insert it first".to_string(),
            ));
        }
        self.run("update", move |dao| dao.update(&entity)).await
    }

    /// Insert-or-update, decided by the identity sentinel alone.
    ///
    /// Returns the identity the record is persisted under either way, so
    /// the result is always valid for a subsequent [`get_by_id`].
    ///
    /// [`get_by_id`]: Repository::get_by_id
    pub async fn upsert(&self, entity: R) -> Result<i64> {
        if entity.id() == UNSAVED_ID {
            self.insert(entity).await
        } else {
            let id = entity.id();
            self.update(entity).await?;
            Ok(id)
        }
    }

    /// Look up one record. Absence is a normal outcome, not an error.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<R>> {
        self.run("get_by_id", move |dao| dao.get_by_id(id)).await
    }

    /// Remove the record matching the entity's identity. Idempotent.
    pub async fn delete(&self, entity: R) -> Result<()> {
        let id = entity.id();
        self.run("delete", move |dao| dao.delete(id)).await
    }

    /// The most recently created or modified records, newest first.
    /// A limit of 0 yields an empty list.
    pub async fn get_recent(&self, limit: u32) -> Result<Vec<R>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.run("get_recent", move |dao| dao.recent(limit)).await
    }

    /// Count all records in the collection.
    pub async fn count(&self) -> Result<u64> {
        self.run("count", |dao| dao.count()).await
    }

    /// Observe the whole collection as a stream of snapshots.
    pub fn observe_all(&self) -> Watcher<R> {
        Watcher::new(Arc::clone(&self.dao), None)
    }

    /// Observe the collection filtered by a substring query.
    pub fn search(&self, query: impl Into<String>) -> Watcher<R> {
        Watcher::new(Arc::clone(&self.dao), Some(query.into()))
    }
}

/// A live view over one collection (optionally filtered).
///
/// The first [`next`] call yields the current snapshot immediately; each
/// later call waits for the collection to change and yields a fresh
/// complete snapshot. Every watcher is independent; dropping one cancels
/// its subscription and, being pull-based, no emission can race the
/// cancellation.
///
/// Bursts of mutations may coalesce into a single emission, but a
/// snapshot is always at least as new as the last completed mutation.
///
/// [`next`]: Watcher::next
pub struct Watcher<R: Record> {
    dao: Arc<SqliteDao<R>>,
    revision: watch::Receiver<u64>,
    query: Option<String>,
    primed: bool,
}

impl<R: Record> Watcher<R> {
    fn new(dao: Arc<SqliteDao<R>>, query: Option<String>) -> Self {
        let revision = dao.watch();
        Self {
            dao,
            revision,
            query,
            primed: false,
        }
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the underlying accessor is gone and no further
    /// emission can ever happen.
    pub async fn next(&mut self) -> Option<Result<Vec<R>>> {
        if self.primed {
            if self.revision.changed().await.is_err() {
                return None;
            }
        } else {
            self.primed = true;
            // Consume the revision seen at subscription time so only
            // mutations after this first snapshot wake us again.
            let _ = self.revision.borrow_and_update();
        }

        let dao = Arc::clone(&self.dao);
        let query = self.query.clone();
        let joined = tokio::task::spawn_blocking(move || match query.as_deref() {
            Some(q) => dao.search(q),
            None => dao.all(),
        })
        .await;

        Some(joined.unwrap_or_else(|e| {
            Err(AtelierError::Storage(format!("snapshot task failed: {}", e)))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::types::{RevisionSession, StudyCard, Work};

    fn make_repo<R: Record>() -> Repository<R> {
        Repository::new(Arc::new(Database::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let repo: Repository<Work> = make_repo();

        let id = repo.insert(Work::new("Essay A", "anon", "text")).await.unwrap();
        assert_eq!(id, 1);

        let found = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.title, "Essay A");
    }

    #[tokio::test]
    async fn test_delete_then_get_is_none() {
        let repo: Repository<Work> = make_repo();

        let id = repo.insert(Work::new("Essay A", "anon", "")).await.unwrap();
        let work = repo.get_by_id(id).await.unwrap().unwrap();

        repo.delete(work.clone()).await.unwrap();
        assert!(repo.get_by_id(id).await.unwrap().is_none());

        // Idempotent: deleting again is fine.
        repo.delete(work).await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_unsaved_inserts_fresh_id() {
        let repo: Repository<RevisionSession> = make_repo();

        let id = repo.upsert(RevisionSession::new("Kanji")).await.unwrap();
        assert!(id > 0);

        let other = repo.upsert(RevisionSession::new("Grammar")).await.unwrap();
        assert_ne!(other, id, "each unsaved upsert gets a previously-unused id");
    }

    #[tokio::test]
    async fn test_upsert_saved_updates_in_place() {
        let repo: Repository<RevisionSession> = make_repo();

        let id = repo.upsert(RevisionSession::new("Kanji")).await.unwrap();

        let mut session = repo.get_by_id(id).await.unwrap().unwrap();
        session.topic = "Grammar".to_string();
        let same = repo.upsert(session).await.unwrap();
        assert_eq!(same, id);

        let found = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.topic, "Grammar");
    }

    #[tokio::test]
    async fn test_update_unsaved_rejected() {
        let repo: Repository<Work> = make_repo();

        let err = repo.update(Work::new("Essay A", "anon", "")).await.unwrap_err();
        assert!(matches!(err, AtelierError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_get_recent_zero_is_empty() {
        let repo: Repository<Work> = make_repo();
        repo.insert(Work::new("A", "", "")).await.unwrap();

        assert!(repo.get_recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_observe_all_initial_snapshot() {
        let repo: Repository<Work> = make_repo();
        repo.insert(Work::new("A", "", "")).await.unwrap();

        let mut watcher = repo.observe_all();
        let snapshot = watcher.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_observe_all_sees_mutation() {
        let repo: Repository<Work> = make_repo();

        let mut watcher = repo.observe_all();
        let snapshot = watcher.next().await.unwrap().unwrap();
        assert!(snapshot.is_empty());

        repo.insert(Work::new("A", "", "")).await.unwrap();
        let snapshot = watcher.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);

        repo.delete(snapshot[0].clone()).await.unwrap();
        let snapshot = watcher.next().await.unwrap().unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_observers_are_independent() {
        let repo: Repository<Work> = make_repo();
        repo.insert(Work::new("A", "", "")).await.unwrap();

        let mut first = repo.observe_all();
        let mut second = repo.observe_all();

        assert_eq!(first.next().await.unwrap().unwrap().len(), 1);
        // A subscriber that joins later still gets the current snapshot.
        assert_eq!(second.next().await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_watcher_immediately() {
        let repo: Repository<Work> = make_repo();

        // Cancelling before the first poll must be safe.
        let watcher = repo.observe_all();
        drop(watcher);

        repo.insert(Work::new("A", "", "")).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_stream_tracks_matches() {
        let repo: Repository<StudyCard> = make_repo();

        repo.insert(StudyCard::new("kanji: 猫", "cat")).await.unwrap();
        repo.insert(StudyCard::new("particle wa", "topic marker"))
            .await
            .unwrap();

        let mut watcher = repo.search("kanji");
        let snapshot = watcher.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);

        repo.insert(StudyCard::new("more kanji", "…")).await.unwrap();
        let snapshot = watcher.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_all_land() {
        let repo: Repository<Work> = make_repo();

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.insert(Work::new(format!("Essay {}", i), "", "")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.count().await.unwrap(), 8);
    }
}
