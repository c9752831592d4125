//! Error types for slide plan resolution.

use crate::types::LayoutId;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading layouts or resolving a spec.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested layout id is not in the registry.
    #[error("Layout {0} not found in registry")]
    LayoutNotFound(LayoutId),

    /// The layout catalog or planner configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A slide entry in an explicit slide list is malformed.
    #[error("Invalid slide {index}: {reason}")]
    Validation { index: usize, reason: String },

    /// Failed to read a catalog or template file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Catalog JSON could not be decoded.
    #[error("Catalog JSON error: {0}")]
    CatalogError(String),

    /// ZIP archive error (for PPTX templates).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX templates).
    #[error("XML parsing error: {0}")]
    XmlError(String),
}
