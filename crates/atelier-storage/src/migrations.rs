//! Database schema migrations.
//!
//! Applies the initial schema: one table per entity collection plus the
//! schema_migrations tracking table. Every entity table shares the same
//! spine: an AUTOINCREMENT integer id (so identities start at 1 and the
//! zero "unsaved" sentinel can never collide) and created_at/updated_at
//! epoch-second columns maintained by the accessor layer.

use rusqlite::Connection;
use tracing::info;

use atelier_core::error::{AtelierError, Result};

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental changes.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create the migrations tracking table first.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| AtelierError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| AtelierError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS works (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            author      TEXT NOT NULL DEFAULT '',
            body        TEXT NOT NULL DEFAULT '',
            language    TEXT,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_works_updated_at
            ON works (updated_at DESC);

        CREATE TABLE IF NOT EXISTS personas (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            tone        TEXT,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_personas_updated_at
            ON personas (updated_at DESC);

        CREATE TABLE IF NOT EXISTS study_cards (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            front       TEXT NOT NULL,
            back        TEXT NOT NULL DEFAULT '',
            topic_id    INTEGER,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_study_cards_updated_at
            ON study_cards (updated_at DESC);

        CREATE INDEX IF NOT EXISTS idx_study_cards_topic
            ON study_cards (topic_id)
            WHERE topic_id IS NOT NULL;

        CREATE TABLE IF NOT EXISTS topics (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            summary     TEXT NOT NULL DEFAULT '',
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_topics_updated_at
            ON topics (updated_at DESC);

        CREATE TABLE IF NOT EXISTS observations (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            text        TEXT NOT NULL,
            source      TEXT,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_observations_updated_at
            ON observations (updated_at DESC);

        CREATE TABLE IF NOT EXISTS custom_routes (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            steps       TEXT NOT NULL DEFAULT '[]',
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_custom_routes_updated_at
            ON custom_routes (updated_at DESC);

        CREATE TABLE IF NOT EXISTS settings (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            key         TEXT NOT NULL UNIQUE,
            value       TEXT NOT NULL DEFAULT '',
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE TABLE IF NOT EXISTS run_logs (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            label       TEXT NOT NULL,
            message     TEXT NOT NULL DEFAULT '',
            level       TEXT NOT NULL DEFAULT 'info'
                        CHECK (level IN ('info', 'warn', 'error')),
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_run_logs_updated_at
            ON run_logs (updated_at DESC);

        CREATE TABLE IF NOT EXISTS practice_sessions (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            topic          TEXT NOT NULL,
            started_at     INTEGER NOT NULL,
            duration_secs  REAL NOT NULL DEFAULT 0.0,
            score          REAL,
            created_at     INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at     INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_practice_sessions_updated_at
            ON practice_sessions (updated_at DESC);

        CREATE TABLE IF NOT EXISTS comparisons (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            left_work_id   INTEGER NOT NULL,
            right_work_id  INTEGER NOT NULL,
            verdict        TEXT NOT NULL DEFAULT 'undecided'
                           CHECK (verdict IN ('left', 'right', 'tie', 'undecided')),
            notes          TEXT NOT NULL DEFAULT '',
            created_at     INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at     INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comparisons_updated_at
            ON comparisons (updated_at DESC);

        CREATE TABLE IF NOT EXISTS experiments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            hypothesis  TEXT NOT NULL DEFAULT '',
            status      TEXT NOT NULL DEFAULT 'draft'
                        CHECK (status IN ('draft', 'running', 'concluded')),
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_experiments_updated_at
            ON experiments (updated_at DESC);

        CREATE TABLE IF NOT EXISTS revision_sessions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            topic       TEXT NOT NULL,
            card_count  INTEGER NOT NULL DEFAULT 0,
            completed   INTEGER NOT NULL DEFAULT 0,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_revision_sessions_updated_at
            ON revision_sessions (updated_at DESC);

        -- Record migration.
        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| AtelierError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
