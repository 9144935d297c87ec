//! Error types for the pagination pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while paginating and exporting a document
#[derive(Error, Debug)]
pub enum Error {
    /// No blocks were discovered in the rendered fragment
    #[error("No content blocks found in the rendered view")]
    NoContent,

    /// A specific block failed to rasterize
    #[error("Rasterizing block {index} failed: {reason}")]
    Raster { index: usize, reason: String },

    /// Assembling the output document failed
    #[error("Emitting PDF failed: {0}")]
    Emit(String),

    /// The pass exceeded its time budget
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An encoded proposal could not be decoded
    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),

    /// Filesystem error while saving
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether re-invoking the same export can reasonably succeed.
    ///
    /// Raster failures are usually transient resource loading problems and
    /// timeouts depend on network conditions; everything else needs a change
    /// to the input or configuration first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Raster { .. } | Error::Timeout(_))
    }

    /// The single message shown to an end user. Block indices and stage
    /// details stay in the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::NoContent => "There is nothing to export in this document.",
            Error::Raster { .. } | Error::Timeout(_) => {
                "Failed to generate PDF. Please try again."
            }
            Error::Emit(_) => "The document is too large to export as a PDF.",
            Error::InvalidProposal(_) => "This proposal link is invalid.",
            Error::Config(_) | Error::Io(_) | Error::Other(_) => "Failed to generate PDF.",
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Emit(err.to_string())
    }
}
