use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Cannot read '{value}' in column {column} as {expected}")]
    Coercion {
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("Unknown control: {0}")]
    UnknownControl(String),

    #[error("Control declared twice: {0}")]
    DuplicateControl(String),

    #[error("Unknown result set: {0}")]
    UnknownSource(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Display slot already bound: {0}")]
    DuplicateSlot(String),

    #[error("Invalid selection for {target}: {reason}")]
    InvalidSelection { target: String, reason: String },

    #[error("{0}")]
    Custom(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
