//! # Error Types
//!
//! This module defines error types used throughout the cardstock library.

use thiserror::Error;

/// Main error type for cardstock operations
#[derive(Debug, Error)]
pub enum CardstockError {
    /// Template fetch/parse failed, or the document has no front side
    #[error("Template load error: {0}")]
    Load(String),

    /// Export would produce no fields
    #[error("Export error: {0}")]
    Export(String),

    /// Card or sheet rendering error
    #[error("Render error: {0}")]
    Render(String),

    /// Image fetch or decode error
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid editor operation
    #[error("Editor error: {0}")]
    Editor(String),

    /// Record store error
    #[error("Store error: {0}")]
    Store(String),

    /// HTTP server error (bind, serve)
    #[error("Server error: {0}")]
    Server(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
