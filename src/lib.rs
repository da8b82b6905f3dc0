//! Belbin Team Roles questionnaire: scoring, interpretation and result history.

use once_cell::sync::Lazy;

pub mod answer;
pub mod backup;
pub mod bulk;
pub mod chart;
pub mod config;
pub mod error;
pub mod question;
pub mod role;
pub mod score;
pub mod store;
pub mod telemetry;

pub use answer::{Answer, AnswerSet, Session, Submission};
pub use bulk::{export_csv, read_bulk};
pub use config::{AppConfig, Variant};
pub use error::{Error, ValidationError};
pub use question::{AnswerOption, Question, QuestionBank, QuestionKind, POINT_BUDGET};
pub use role::{Role, RoleCategory};
pub use score::{ScoreMap, ScoringEngine, DEFAULT_TOP_N};
pub use store::{ResultStore, Statistics, StoredResult};

/// Self-perception inventory: 10 points are spread over eight statements per question.
pub static POINT_ALLOCATION: Lazy<QuestionBank> = Lazy::new(|| {
    serde_json::from_str(include_str!("../resources/point_allocation.json"))
        .expect("bundled point allocation bank is valid json")
});

/// Quick inventory: one statement is picked per question.
pub static SINGLE_CHOICE: Lazy<QuestionBank> = Lazy::new(|| {
    serde_json::from_str(include_str!("../resources/single_choice.json"))
        .expect("bundled single choice bank is valid json")
});
