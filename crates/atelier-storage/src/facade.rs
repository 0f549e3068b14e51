//! The application-wide repository facade.
//!
//! One [`AppRepository`] is built at startup over a single shared
//! [`Database`] and handed to every consumer. It is nothing more than the
//! twelve entity repositories side by side; all behavior lives in
//! [`Repository`](crate::repository::Repository).

use std::sync::Arc;

use atelier_core::error::Result;
use atelier_core::types::{
    Comparison, CustomRoute, Experiment, Observation, Persona, PracticeSession, RevisionSession,
    RunLog, Setting, StudyCard, Topic, Work,
};

use crate::db::Database;
use crate::repository::Repository;

/// Process-wide facade over every entity collection.
///
/// Cheap to clone (all fields are Arc-backed); a failure on one entity's
/// accessor never affects another, since each repository only shares the
/// connection, not error state.
#[derive(Clone)]
pub struct AppRepository {
    pub works: Repository<Work>,
    pub personas: Repository<Persona>,
    pub study_cards: Repository<StudyCard>,
    pub topics: Repository<Topic>,
    pub observations: Repository<Observation>,
    pub custom_routes: Repository<CustomRoute>,
    pub settings: Repository<Setting>,
    pub run_logs: Repository<RunLog>,
    pub practice_sessions: Repository<PracticeSession>,
    pub comparisons: Repository<Comparison>,
    pub experiments: Repository<Experiment>,
    pub revision_sessions: Repository<RevisionSession>,
}

impl AppRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            works: Repository::new(Arc::clone(&db)),
            personas: Repository::new(Arc::clone(&db)),
            study_cards: Repository::new(Arc::clone(&db)),
            topics: Repository::new(Arc::clone(&db)),
            observations: Repository::new(Arc::clone(&db)),
            custom_routes: Repository::new(Arc::clone(&db)),
            settings: Repository::new(Arc::clone(&db)),
            run_logs: Repository::new(Arc::clone(&db)),
            practice_sessions: Repository::new(Arc::clone(&db)),
            comparisons: Repository::new(Arc::clone(&db)),
            experiments: Repository::new(Arc::clone(&db)),
            revision_sessions: Repository::new(db),
        }
    }

    /// Row counts across every collection, for diagnostics.
    pub async fn stats(&self) -> Result<RepositoryStats> {
        Ok(RepositoryStats {
            works: self.works.count().await?,
            personas: self.personas.count().await?,
            study_cards: self.study_cards.count().await?,
            topics: self.topics.count().await?,
            observations: self.observations.count().await?,
            custom_routes: self.custom_routes.count().await?,
            settings: self.settings.count().await?,
            run_logs: self.run_logs.count().await?,
            practice_sessions: self.practice_sessions.count().await?,
            comparisons: self.comparisons.count().await?,
            experiments: self.experiments.count().await?,
            revision_sessions: self.revision_sessions.count().await?,
        })
    }
}

/// Per-collection row counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub works: u64,
    pub personas: u64,
    pub study_cards: u64,
    pub topics: u64,
    pub observations: u64,
    pub custom_routes: u64,
    pub settings: u64,
    pub run_logs: u64,
    pub practice_sessions: u64,
    pub comparisons: u64,
    pub experiments: u64,
    pub revision_sessions: u64,
}

impl RepositoryStats {
    /// Total records across all collections.
    pub fn total(&self) -> u64 {
        self.works
            + self.personas
            + self.study_cards
            + self.topics
            + self.observations
            + self.custom_routes
            + self.settings
            + self.run_logs
            + self.practice_sessions
            + self.comparisons
            + self.experiments
            + self.revision_sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_facade() -> AppRepository {
        AppRepository::new(Arc::new(Database::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_collections_are_independent() {
        let repo = make_facade();

        repo.works
            .insert(Work::new("Essay A", "anon", ""))
            .await
            .unwrap();
        repo.topics
            .insert(Topic::new("Kanji", "characters"))
            .await
            .unwrap();

        assert_eq!(repo.works.count().await.unwrap(), 1);
        assert_eq!(repo.topics.count().await.unwrap(), 1);
        assert_eq!(repo.personas.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failure_on_one_collection_leaves_others_usable() {
        let repo = make_facade();

        repo.settings
            .insert(Setting::new("theme", "dark"))
            .await
            .unwrap();
        // Violates the settings key constraint.
        let err = repo.settings.insert(Setting::new("theme", "light")).await;
        assert!(err.is_err());

        // Other collections keep working.
        repo.works
            .insert(Work::new("Essay A", "anon", ""))
            .await
            .unwrap();
        assert_eq!(repo.works.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stats_counts_everything() {
        let repo = make_facade();

        repo.works
            .insert(Work::new("Essay A", "anon", ""))
            .await
            .unwrap();
        repo.run_logs
            .insert(RunLog::new("morning drill", "ok"))
            .await
            .unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.works, 1);
        assert_eq!(stats.run_logs, 1);
        assert_eq!(stats.total(), 2);
    }

    #[tokio::test]
    async fn test_facade_clone_shares_storage() {
        let repo = make_facade();
        let clone = repo.clone();

        repo.works
            .insert(Work::new("Essay A", "anon", ""))
            .await
            .unwrap();
        assert_eq!(clone.works.count().await.unwrap(), 1);
    }
}
