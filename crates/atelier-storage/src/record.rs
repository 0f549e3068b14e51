//! Storage descriptions for entity types.
//!
//! [`Record`] is the contract between a domain entity and the generic
//! accessor in `dao.rs`: the table it persists to, its column list, how to
//! bind a struct into column values, and how to rebuild one from a row.
//! Everything the accessor does (SQL text included) is derived from these
//! descriptions, so each new entity costs one impl block here plus a table
//! in the migration.

use chrono::TimeZone;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::Row;

use atelier_core::types::{
    Comparison, ComparisonVerdict, CustomRoute, Experiment, ExperimentStatus, Observation,
    Persona, PracticeSession, RevisionSession, RunLevel, RunLog, Setting, StudyCard, Topic, Work,
};

/// Per-entity storage description consumed by the generic accessor.
///
/// Rows are always selected as `id, COLUMNS...`; `from_row` must read them
/// in that order. `created_at`/`updated_at` are maintained by the accessor's
/// SQL and never pass through the domain struct.
pub trait Record: Clone + Send + Sync + 'static {
    /// Table this record persists to.
    const TABLE: &'static str;
    /// Non-identity columns, in `bind` order.
    const COLUMNS: &'static [&'static str];
    /// Columns matched by substring search; empty marks a list-only
    /// collection whose search degenerates to observe-all.
    const SEARCH_COLUMNS: &'static [&'static str];

    /// Current identity; 0 while unsaved.
    fn id(&self) -> i64;

    /// Column values in `COLUMNS` order.
    fn bind(&self) -> Vec<Value>;

    /// Rebuild from a row selected as `id, COLUMNS...`.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Escape LIKE wildcards in user input so a query matches literally.
/// `\` is declared as the escape character in the generated SQL.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl Record for Work {
    const TABLE: &'static str = "works";
    const COLUMNS: &'static [&'static str] = &["title", "author", "body", "language"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["title", "author", "body"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        vec![
            self.title.clone().into(),
            self.author.clone().into(),
            self.body.clone().into(),
            self.language.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            body: row.get(3)?,
            language: row.get(4)?,
        })
    }
}

impl Record for Persona {
    const TABLE: &'static str = "personas";
    const COLUMNS: &'static [&'static str] = &["name", "description", "tone"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "description"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        vec![
            self.name.clone().into(),
            self.description.clone().into(),
            self.tone.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            tone: row.get(3)?,
        })
    }
}

impl Record for StudyCard {
    const TABLE: &'static str = "study_cards";
    const COLUMNS: &'static [&'static str] = &["front", "back", "topic_id"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["front", "back"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        vec![
            self.front.clone().into(),
            self.back.clone().into(),
            self.topic_id.into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            front: row.get(1)?,
            back: row.get(2)?,
            topic_id: row.get(3)?,
        })
    }
}

impl Record for Topic {
    const TABLE: &'static str = "topics";
    const COLUMNS: &'static [&'static str] = &["name", "summary"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "summary"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        vec![self.name.clone().into(), self.summary.clone().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            summary: row.get(2)?,
        })
    }
}

impl Record for Observation {
    const TABLE: &'static str = "observations";
    const COLUMNS: &'static [&'static str] = &["text", "source"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["text", "source"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        vec![self.text.clone().into(), self.source.clone().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            source: row.get(2)?,
        })
    }
}

impl Record for CustomRoute {
    const TABLE: &'static str = "custom_routes";
    const COLUMNS: &'static [&'static str] = &["name", "steps"];
    // List-only collection.
    const SEARCH_COLUMNS: &'static [&'static str] = &[];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        let steps = serde_json::to_string(&self.steps).unwrap_or_else(|_| "[]".to_string());
        vec![self.name.clone().into(), steps.into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let steps_json: String = row.get(2)?;
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            // Malformed stored JSON degrades to an empty plan.
            steps: serde_json::from_str(&steps_json).unwrap_or_default(),
        })
    }
}

impl Record for Setting {
    const TABLE: &'static str = "settings";
    const COLUMNS: &'static [&'static str] = &["key", "value"];
    const SEARCH_COLUMNS: &'static [&'static str] = &[];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        vec![self.key.clone().into(), self.value.clone().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            key: row.get(1)?,
            value: row.get(2)?,
        })
    }
}

impl Record for RunLog {
    const TABLE: &'static str = "run_logs";
    const COLUMNS: &'static [&'static str] = &["label", "message", "level"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["label", "message"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        vec![
            self.label.clone().into(),
            self.message.clone().into(),
            self.level.as_str().to_string().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let level: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
            message: row.get(2)?,
            level: RunLevel::parse(&level),
        })
    }
}

impl Record for PracticeSession {
    const TABLE: &'static str = "practice_sessions";
    const COLUMNS: &'static [&'static str] = &["topic", "started_at", "duration_secs", "score"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["topic"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        vec![
            self.topic.clone().into(),
            Value::Integer(self.started_at.timestamp()),
            self.duration_secs.into(),
            self.score.into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let started_at: i64 = row.get(2)?;
        Ok(Self {
            id: row.get(0)?,
            topic: row.get(1)?,
            started_at: Utc
                .timestamp_opt(started_at, 0)
                .single()
                .unwrap_or_default(),
            duration_secs: row.get(3)?,
            score: row.get(4)?,
        })
    }
}

impl Record for Comparison {
    const TABLE: &'static str = "comparisons";
    const COLUMNS: &'static [&'static str] =
        &["left_work_id", "right_work_id", "verdict", "notes"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["notes"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        vec![
            self.left_work_id.into(),
            self.right_work_id.into(),
            self.verdict.as_str().to_string().into(),
            self.notes.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let verdict: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            left_work_id: row.get(1)?,
            right_work_id: row.get(2)?,
            verdict: ComparisonVerdict::parse(&verdict),
            notes: row.get(4)?,
        })
    }
}

impl Record for Experiment {
    const TABLE: &'static str = "experiments";
    const COLUMNS: &'static [&'static str] = &["name", "hypothesis", "status"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "hypothesis"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        vec![
            self.name.clone().into(),
            self.hypothesis.clone().into(),
            self.status.as_str().to_string().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            hypothesis: row.get(2)?,
            status: ExperimentStatus::parse(&status),
        })
    }
}

impl Record for RevisionSession {
    const TABLE: &'static str = "revision_sessions";
    const COLUMNS: &'static [&'static str] = &["topic", "card_count", "completed"];
    const SEARCH_COLUMNS: &'static [&'static str] = &["topic"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind(&self) -> Vec<Value> {
        vec![
            self.topic.clone().into(),
            Value::Integer(self.card_count as i64),
            self.completed.into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let card_count: i64 = row.get(2)?;
        let completed: i64 = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            topic: row.get(1)?,
            card_count: card_count as u32,
            completed: completed != 0,
        })
    }
}
