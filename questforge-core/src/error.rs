use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuestforgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid editor state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QuestforgeError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        QuestforgeError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QuestforgeError>;
