//! Error types for the ambient layers (config, files, image encoding).
//!
//! The classification and clustering passes themselves cannot fail.

use std::path::PathBuf;

/// Top-level error type for density_vision operations.
#[derive(Debug, thiserror::Error)]
pub enum DensityError {
    #[error("Configuration error: {message}")]
    InvalidConfig { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Result type alias using DensityError.
pub type DensityResult<T> = Result<T, DensityError>;

impl DensityError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: msg.into(),
        }
    }
}
