use crate::config::ConfigError;

/// Crate level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Nothing to draw: every score is zero, or there are no entries at all.
    #[error("no non-zero data to render")]
    EmptyInput,
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Rejections raised while an answer set is being collected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("question {0} does not exist")]
    UnknownQuestion(usize),
    #[error("question {question} has no option '{key}'")]
    UnknownOption { question: usize, key: String },
    #[error("question {question}: option '{key}' got {points} points, expected 0..=10")]
    PointsOutOfRange {
        question: usize,
        key: String,
        points: u32,
    },
    #[error("question {question}: points must add up to 10, got {total}")]
    BudgetMismatch { question: usize, total: u32 },
    #[error("question {0} does not take this kind of answer")]
    WrongKind(usize),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("{0} question(s) left unanswered")]
    Incomplete(usize),
    #[error("malformed answer '{0}'")]
    Malformed(String),
}
