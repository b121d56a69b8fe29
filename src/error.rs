use thiserror::Error;

#[derive(Debug, Error)]
pub enum StylegenError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Relay error: {0}")]
    Relay(String),
    #[error("Storage parse error: {0}")]
    StorageParse(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Generation cancelled")]
    Cancelled,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StylegenError {
    /// Message as it should appear to the user, without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            StylegenError::Validation(msg)
            | StylegenError::Upstream(msg)
            | StylegenError::Transport(msg)
            | StylegenError::Relay(msg)
            | StylegenError::StorageParse(msg)
            | StylegenError::Storage(msg)
            | StylegenError::Config(msg)
            | StylegenError::Serialization(msg)
            | StylegenError::Internal(msg) => msg.clone(),
            StylegenError::Cancelled => "Generation cancelled".to_string(),
        }
    }
}

impl From<serde_json::Error> for StylegenError {
    fn from(e: serde_json::Error) -> Self {
        StylegenError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StylegenError>;
