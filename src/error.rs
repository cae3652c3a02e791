use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("Please enter a valid API key")]
    MissingCredential,
    #[error("Failed to generate image: {0}")]
    GenerationFailed(String),
    #[error("No gallery record at position {position} (gallery holds {len})")]
    InvalidPosition { position: i64, len: usize },
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Errors the workflow reports to the user instead of treating as faults.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::EmptyPrompt
                | AppError::MissingCredential
                | AppError::GenerationFailed(_)
                | AppError::InvalidPosition { .. }
        )
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Other(value)
    }
}

impl From<&str> for AppError {
    fn from(value: &str) -> Self {
        AppError::Other(value.to_string())
    }
}
