use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity value of a record that has not been persisted yet.
///
/// The storage layer assigns identities starting at 1, so 0 can never
/// collide with a persisted record.
pub const UNSAVED_ID: i64 = 0;

// =============================================================================
// Enums
// =============================================================================

/// Severity of a run log entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLevel {
    #[default]
    Info,
    Warn,
    Error,
}

impl RunLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunLevel::Info => "info",
            RunLevel::Warn => "warn",
            RunLevel::Error => "error",
        }
    }

    /// Parse a stored level string; unknown values fall back to `Info`.
    pub fn parse(s: &str) -> Self {
        match s {
            "warn" => RunLevel::Warn,
            "error" => RunLevel::Error,
            _ => RunLevel::Info,
        }
    }
}

/// Lifecycle state of a self-study experiment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    /// Being written up, not yet started.
    #[default]
    Draft,
    /// Currently gathering practice data.
    Running,
    /// Finished, conclusion recorded.
    Concluded,
}

impl ExperimentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperimentStatus::Draft => "draft",
            ExperimentStatus::Running => "running",
            ExperimentStatus::Concluded => "concluded",
        }
    }

    /// Parse a stored status string; unknown values fall back to `Draft`.
    pub fn parse(s: &str) -> Self {
        match s {
            "running" => ExperimentStatus::Running,
            "concluded" => ExperimentStatus::Concluded,
            _ => ExperimentStatus::Draft,
        }
    }
}

/// Outcome of a side-by-side comparison of two works.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonVerdict {
    /// The first work read better.
    Left,
    /// The second work read better.
    Right,
    /// No meaningful difference.
    Tie,
    /// Judgment deferred.
    #[default]
    Undecided,
}

impl ComparisonVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonVerdict::Left => "left",
            ComparisonVerdict::Right => "right",
            ComparisonVerdict::Tie => "tie",
            ComparisonVerdict::Undecided => "undecided",
        }
    }

    /// Parse a stored verdict string; unknown values fall back to `Undecided`.
    pub fn parse(s: &str) -> Self {
        match s {
            "left" => ComparisonVerdict::Left,
            "right" => ComparisonVerdict::Right,
            "tie" => ComparisonVerdict::Tie,
            _ => ComparisonVerdict::Undecided,
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A studied text: an essay, passage, or model piece kept for reference.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Work {
    /// Storage-assigned identity; 0 while unsaved.
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Full text body.
    pub body: String,
    /// Language tag (e.g. "ja", "en"), if known.
    pub language: Option<String>,
}

impl Work {
    /// Create an unsaved work.
    pub fn new(title: impl Into<String>, author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            title: title.into(),
            author: author.into(),
            body: body.into(),
            language: None,
        }
    }
}

/// An authorial voice the user practices imitating.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Short tonal register note ("formal", "wry"), if set.
    pub tone: Option<String>,
}

impl Persona {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            name: name.into(),
            description: description.into(),
            tone: None,
        }
    }
}

/// A prompt/answer drill card.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyCard {
    pub id: i64,
    /// Prompt side.
    pub front: String,
    /// Answer side.
    pub back: String,
    /// Owning topic, if the card has been filed under one.
    pub topic_id: Option<i64>,
}

impl StudyCard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            front: front.into(),
            back: back.into(),
            topic_id: None,
        }
    }
}

/// A subject area, e.g. "Kanji" or "Grammar".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    pub summary: String,
}

impl Topic {
    pub fn new(name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            name: name.into(),
            summary: summary.into(),
        }
    }
}

/// A free-form study note.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub text: String,
    /// Where the observation came from (a work title, a lesson), if noted.
    pub source: Option<String>,
}

impl Observation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            text: text.into(),
            source: None,
        }
    }
}

/// An ordered study plan assembled by the user.
///
/// Steps are free-form labels ("review kanji deck", "write 200 words as
/// Persona X") persisted as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomRoute {
    pub id: i64,
    pub name: String,
    pub steps: Vec<String>,
}

impl CustomRoute {
    pub fn new(name: impl Into<String>, steps: Vec<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            name: name.into(),
            steps,
        }
    }
}

/// A single key/value application preference.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub id: i64,
    /// Preference key; unique in storage.
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A record of an application or practice run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub id: i64,
    /// Short label identifying the run ("morning drill").
    pub label: String,
    pub message: String,
    pub level: RunLevel,
}

impl RunLog {
    pub fn new(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            label: label.into(),
            message: message.into(),
            level: RunLevel::Info,
        }
    }
}

/// A timed drill session against one topic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PracticeSession {
    pub id: i64,
    pub topic: String,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    /// Self-assessed score in [0, 1], if recorded.
    pub score: Option<f64>,
}

impl PracticeSession {
    pub fn new(topic: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: UNSAVED_ID,
            topic: topic.into(),
            started_at,
            duration_secs: 0.0,
            score: None,
        }
    }
}

/// A side-by-side judgment of two works.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub id: i64,
    pub left_work_id: i64,
    pub right_work_id: i64,
    pub verdict: ComparisonVerdict,
    pub notes: String,
}

impl Comparison {
    pub fn new(left_work_id: i64, right_work_id: i64) -> Self {
        Self {
            id: UNSAVED_ID,
            left_work_id,
            right_work_id,
            verdict: ComparisonVerdict::Undecided,
            notes: String::new(),
        }
    }
}

/// A structured self-study experiment ("does copying before composing help?").
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: i64,
    pub name: String,
    pub hypothesis: String,
    pub status: ExperimentStatus,
}

impl Experiment {
    pub fn new(name: impl Into<String>, hypothesis: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            name: name.into(),
            hypothesis: hypothesis.into(),
            status: ExperimentStatus::Draft,
        }
    }
}

/// A revision pass over one topic's material.
///
/// The canonical insert-or-update entity: screens create one with id 0 and
/// keep calling upsert as the user works through it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionSession {
    pub id: i64,
    pub topic: String,
    /// Cards reviewed so far.
    pub card_count: u32,
    pub completed: bool,
}

impl RevisionSession {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            topic: topic.into(),
            card_count: 0,
            completed: false,
        }
    }
}
