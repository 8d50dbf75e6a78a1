//! Error types for PermToggle
//! 
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for PermToggle
#[derive(Error, Debug)]
pub enum PermToggleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Grant backend error: {0}")]
    Backend(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias for PermToggle operations
pub type Result<T> = std::result::Result<T, PermToggleError>;

impl PermToggleError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PermToggleError::Io(e) => format!("File operation failed: {}", e),
            PermToggleError::Config(msg) => format!("Configuration error: {}", msg),
            PermToggleError::NotFound(msg) => format!("Not found: {}", msg),
            PermToggleError::Backend(msg) => {
                format!("Could not change the permission: {}. The switch was restored.", msg)
            }
            _ => self.to_string(),
        }
    }
}
