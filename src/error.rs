use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoctreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Missing input {path}\n{hint}")]
    MissingInput { path: String, hint: String },

    #[error("Root location {0} not found")]
    MissingRoot(i64),

    #[error("Location {0} not found")]
    MissingLocation(i64),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LoctreeError>;
