//! Error types for Hearth

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Unsupported bank code: {0}")]
    UnsupportedBank(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient training data: {0}")]
    InsufficientTrainingData(String),

    #[error("No trained model for household {0}")]
    ModelNotFound(i64),

    #[error("Training error: {0}")]
    Training(String),
}

pub type Result<T> = std::result::Result<T, Error>;
