//! Error types for Boardsight Core

use thiserror::Error;

/// Result type alias using the Boardsight Error
pub type Result<T> = std::result::Result<T, Error>;

/// Boardsight error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Board error: {0}")]
    Board(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Tool-specific errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}
