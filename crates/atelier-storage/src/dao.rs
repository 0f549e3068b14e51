//! Generic SQLite storage accessor.
//!
//! One [`SqliteDao`] per entity collection executes all reads and writes
//! for that collection and owns its change-notification channel. The
//! repository layer depends only on this accessor surface, never on SQL
//! or schema details.

use std::marker::PhantomData;
use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, OptionalExtension};
use tokio::sync::watch;
use tracing::debug;

use atelier_core::error::{AtelierError, Result};

use crate::db::Database;
use crate::record::{escape_like, Record};

/// Storage accessor for one entity collection.
///
/// Mutations that change rows bump a revision counter on a watch channel;
/// reactive subscriptions re-query the collection whenever the counter
/// moves. The counter carries no data, so observers always read the
/// committed state of the table, never a stale payload.
pub struct SqliteDao<R: Record> {
    db: Arc<Database>,
    revision: watch::Sender<u64>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> SqliteDao<R> {
    pub fn new(db: Arc<Database>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            db,
            revision,
            _record: PhantomData,
        }
    }

    /// Subscribe to revision bumps for this collection.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn select_list() -> String {
        format!("SELECT id, {} FROM {}", R::COLUMNS.join(", "), R::TABLE)
    }

    /// Insert a new record and return its assigned identity.
    ///
    /// The record's own id field is ignored; the table's AUTOINCREMENT
    /// column assigns the identity.
    pub fn insert(&self, record: &R) -> Result<i64> {
        let placeholders: Vec<String> =
            (1..=R::COLUMNS.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            R::TABLE,
            R::COLUMNS.join(", "),
            placeholders.join(", ")
        );

        let values = record.bind();
        let id = self.db.with_conn(|conn| {
            conn.execute(&sql, params_from_iter(values))
                .map_err(|e| {
                    AtelierError::Storage(format!("Failed to insert into {}: {}", R::TABLE, e))
                })?;
            Ok(conn.last_insert_rowid())
        })?;

        debug!(table = R::TABLE, id, "record inserted");
        self.notify();
        Ok(id)
    }

    /// Overwrite the record matching the given identity.
    ///
    /// Updating an identity that no longer exists changes nothing and is
    /// not an error.
    pub fn update(&self, record: &R) -> Result<()> {
        let sets: Vec<String> = R::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = ?{}", col, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {}, updated_at = strftime('%s', 'now') WHERE id = ?{}",
            R::TABLE,
            sets.join(", "),
            R::COLUMNS.len() + 1
        );

        let mut values = record.bind();
        values.push(Value::Integer(record.id()));
        let affected = self.db.with_conn(|conn| {
            conn.execute(&sql, params_from_iter(values)).map_err(|e| {
                AtelierError::Storage(format!("Failed to update {}: {}", R::TABLE, e))
            })
        })?;

        if affected > 0 {
            debug!(table = R::TABLE, id = record.id(), "record updated");
            self.notify();
        }
        Ok(())
    }

    /// Find a record by identity.
    pub fn get_by_id(&self, id: i64) -> Result<Option<R>> {
        let sql = format!("{} WHERE id = ?1", Self::select_list());
        self.db.with_conn(|conn| {
            conn.query_row(&sql, [id], |row| R::from_row(row))
                .optional()
                .map_err(|e| {
                    AtelierError::Storage(format!("Failed to read {}: {}", R::TABLE, e))
                })
        })
    }

    /// Delete the record with the given identity. Idempotent: deleting an
    /// absent identity affects zero rows and succeeds.
    pub fn delete(&self, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", R::TABLE);
        let affected = self.db.with_conn(|conn| {
            conn.execute(&sql, [id]).map_err(|e| {
                AtelierError::Storage(format!("Failed to delete from {}: {}", R::TABLE, e))
            })
        })?;

        if affected > 0 {
            debug!(table = R::TABLE, id, "record deleted");
            self.notify();
        }
        Ok(())
    }

    /// Every record in the collection, ordered by identity.
    pub fn all(&self) -> Result<Vec<R>> {
        let sql = format!("{} ORDER BY id ASC", Self::select_list());
        self.query_rows(&sql, Vec::new())
    }

    /// Records whose searchable columns contain the query as a substring
    /// (case-insensitive for ASCII, per SQLite LIKE).
    ///
    /// An empty query, or a collection with no searchable columns, returns
    /// everything.
    pub fn search(&self, query: &str) -> Result<Vec<R>> {
        if query.trim().is_empty() || R::SEARCH_COLUMNS.is_empty() {
            return self.all();
        }

        let clauses: Vec<String> = R::SEARCH_COLUMNS
            .iter()
            .map(|col| format!("{} LIKE ?1 ESCAPE '\\'", col))
            .collect();
        let sql = format!(
            "{} WHERE {} ORDER BY id ASC",
            Self::select_list(),
            clauses.join(" OR ")
        );
        let pattern = format!("%{}%", escape_like(query));
        self.query_rows(&sql, vec![Value::Text(pattern)])
    }

    /// The most recently created or modified records, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<R>> {
        let sql = format!(
            "{} ORDER BY updated_at DESC, id DESC LIMIT ?1",
            Self::select_list()
        );
        self.query_rows(&sql, vec![Value::Integer(limit as i64)])
    }

    /// Count all records in the collection.
    pub fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", R::TABLE);
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(&sql, [], |row| row.get(0))
                .map_err(|e| {
                    AtelierError::Storage(format!("Failed to count {}: {}", R::TABLE, e))
                })?;
            Ok(count as u64)
        })
    }

    fn query_rows(&self, sql: &str, values: Vec<Value>) -> Result<Vec<R>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(sql).map_err(|e| {
                AtelierError::Storage(format!("Failed to prepare query on {}: {}", R::TABLE, e))
            })?;

            let rows = stmt
                .query_map(params_from_iter(values), |row| R::from_row(row))
                .map_err(|e| {
                    AtelierError::Storage(format!("Failed to query {}: {}", R::TABLE, e))
                })?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row.map_err(|e| {
                    AtelierError::Storage(format!("Failed to read {} row: {}", R::TABLE, e))
                })?);
            }
            Ok(records)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::types::{RevisionSession, Setting, StudyCard, Work};

    fn make_dao<R: Record>() -> SqliteDao<R> {
        SqliteDao::new(Arc::new(Database::in_memory().unwrap()))
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let dao: SqliteDao<Work> = make_dao();

        let first = dao.insert(&Work::new("Essay A", "anon", "text a")).unwrap();
        let second = dao.insert(&Work::new("Essay B", "anon", "text b")).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let dao: SqliteDao<Work> = make_dao();

        let mut work = Work::new("Essay A", "Sōseki", "I am a cat.");
        work.language = Some("ja".to_string());
        let id = dao.insert(&work).unwrap();

        let found = dao.get_by_id(id).unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.title, "Essay A");
        assert_eq!(found.author, "Sōseki");
        assert_eq!(found.language.as_deref(), Some("ja"));
    }

    #[test]
    fn test_get_nonexistent_is_none() {
        let dao: SqliteDao<Work> = make_dao();
        assert!(dao.get_by_id(42).unwrap().is_none());
    }

    #[test]
    fn test_update_overwrites_fields() {
        let dao: SqliteDao<RevisionSession> = make_dao();

        let id = dao.insert(&RevisionSession::new("Kanji")).unwrap();
        let mut session = dao.get_by_id(id).unwrap().unwrap();
        session.topic = "Grammar".to_string();
        session.card_count = 7;
        dao.update(&session).unwrap();

        let found = dao.get_by_id(id).unwrap().unwrap();
        assert_eq!(found.topic, "Grammar");
        assert_eq!(found.card_count, 7);
    }

    #[test]
    fn test_update_nonexistent_is_noop() {
        let dao: SqliteDao<Work> = make_dao();
        let mut rx = dao.watch();

        let mut work = Work::new("ghost", "", "");
        work.id = 99;
        dao.update(&work).unwrap();

        // No row changed, so no revision bump either.
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dao: SqliteDao<Work> = make_dao();

        let id = dao.insert(&Work::new("Essay A", "anon", "")).unwrap();
        dao.delete(id).unwrap();
        assert!(dao.get_by_id(id).unwrap().is_none());

        // Second delete of the same identity is a no-op, not a failure.
        dao.delete(id).unwrap();
        assert_eq!(dao.count().unwrap(), 0);
    }

    #[test]
    fn test_all_ordered_without_duplicates() {
        let dao: SqliteDao<Work> = make_dao();

        dao.insert(&Work::new("A", "", "")).unwrap();
        dao.insert(&Work::new("B", "", "")).unwrap();
        dao.insert(&Work::new("C", "", "")).unwrap();

        let all = dao.all().unwrap();
        let ids: Vec<i64> = all.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_search_substring_match() {
        let dao: SqliteDao<StudyCard> = make_dao();

        dao.insert(&StudyCard::new("kanji: 猫", "cat")).unwrap();
        dao.insert(&StudyCard::new("particle wa", "topic marker"))
            .unwrap();

        let hits = dao.search("kanji").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].front, "kanji: 猫");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let dao: SqliteDao<StudyCard> = make_dao();
        dao.insert(&StudyCard::new("Kanji drill", "…")).unwrap();

        assert_eq!(dao.search("kanji").unwrap().len(), 1);
    }

    #[test]
    fn test_search_empty_query_returns_all() {
        let dao: SqliteDao<StudyCard> = make_dao();
        dao.insert(&StudyCard::new("a", "b")).unwrap();
        dao.insert(&StudyCard::new("c", "d")).unwrap();

        assert_eq!(dao.search("").unwrap().len(), 2);
        assert_eq!(dao.search("   ").unwrap().len(), 2);
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let dao: SqliteDao<StudyCard> = make_dao();
        dao.insert(&StudyCard::new("100% effort", "")).unwrap();
        dao.insert(&StudyCard::new("100x effort", "")).unwrap();

        // A literal % must not act as a wildcard.
        let hits = dao.search("100%").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].front, "100% effort");
    }

    #[test]
    fn test_search_on_list_only_collection_returns_all() {
        let dao: SqliteDao<Setting> = make_dao();
        dao.insert(&Setting::new("theme", "dark")).unwrap();

        assert_eq!(dao.search("anything").unwrap().len(), 1);
    }

    #[test]
    fn test_recent_newest_first() {
        let dao: SqliteDao<Work> = make_dao();

        dao.insert(&Work::new("A", "", "")).unwrap();
        dao.insert(&Work::new("B", "", "")).unwrap();
        dao.insert(&Work::new("C", "", "")).unwrap();

        let recent = dao.recent(2).unwrap();
        let titles: Vec<&str> = recent.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "B"]);
    }

    #[test]
    fn test_mutations_bump_revision() {
        let dao: SqliteDao<Work> = make_dao();
        let mut rx = dao.watch();

        let id = dao.insert(&Work::new("A", "", "")).unwrap();
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        let mut work = dao.get_by_id(id).unwrap().unwrap();
        work.title = "A2".to_string();
        dao.update(&work).unwrap();
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        dao.delete(id).unwrap();
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        // Deleting an already-removed identity changes nothing.
        dao.delete(id).unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_unique_violation_surfaces_as_storage_error() {
        let dao: SqliteDao<Setting> = make_dao();

        dao.insert(&Setting::new("theme", "dark")).unwrap();
        let err = dao.insert(&Setting::new("theme", "light")).unwrap_err();
        assert!(matches!(err, AtelierError::Storage(_)));
        assert!(err.to_string().contains("settings"));
    }

    #[test]
    fn test_custom_route_steps_roundtrip() {
        use atelier_core::types::CustomRoute;

        let dao: SqliteDao<CustomRoute> = make_dao();
        let route = CustomRoute::new(
            "warmup",
            vec!["review kanji deck".to_string(), "write 200 words".to_string()],
        );
        let id = dao.insert(&route).unwrap();

        let found = dao.get_by_id(id).unwrap().unwrap();
        assert_eq!(found.steps.len(), 2);
        assert_eq!(found.steps[0], "review kanji deck");
    }
}
