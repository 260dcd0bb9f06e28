/*! Error types for tracker operations. */

use super::SessionId;

/// Errors that can occur during tracker operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
  #[error("Session not found: {0}")]
  SessionNotFound(SessionId),

  #[error("Invalid track options: {0}")]
  InvalidOptions(#[from] serde_json::Error),

  #[error("Method not supported: {0}")]
  UnsupportedMethod(String),
}

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;
