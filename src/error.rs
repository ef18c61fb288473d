use serde::Serialize;
use thiserror::Error;

/// Rejections raised before a generation request reaches the generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Prompt is {length} characters, limit is {limit}")]
    PromptTooLong { length: usize, limit: usize },

    #[error("Description is {length} characters, limit is {limit}")]
    DescriptionTooLong { length: usize, limit: usize },

    #[error("No image files were provided")]
    NoFiles,

    #[error("{count} files uploaded, limit is {limit}")]
    TooManyFiles { count: usize, limit: usize },

    #[error("File {name} is {size} bytes, limit is {limit}")]
    FileTooLarge { name: String, size: usize, limit: usize },

    #[error("File {0} is not a JPEG or PNG image")]
    InvalidFormat(String),

    #[error("Generation service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Project error: {0}")]
    Project(String),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

// Serialize as the display string so errors can cross the command boundary
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type AppResult<T> = Result<T, AppError>;
