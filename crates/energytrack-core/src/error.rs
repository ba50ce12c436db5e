use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("unknown drink id '{0}'")]
    UnknownDrink(String),

    #[error("no drink at index {index} on {date}")]
    DrinkNotFound { date: String, index: usize },

    #[error("invalid chart view '{0}' (expected 'daily' or 'annual')")]
    InvalidView(String),

    #[error("invalid sex '{0}' (expected 'male' or 'female')")]
    InvalidSex(String),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("malformed consumption data: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
