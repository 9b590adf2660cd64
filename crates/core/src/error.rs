//! Error types for the Vanguard forge.

use thiserror::Error;

use crate::swarm::PipelineState;

#[derive(Error, Debug)]
pub enum ForgeError {
    /// The content generator rejected the request or returned unusable output.
    #[error("{0}")]
    Generation(String),

    /// Refine was requested without a result or source image.
    #[error("Precondition failed: {0}")]
    Precondition(&'static str),

    #[error("Forge is busy ({})", .0.as_str())]
    Busy(PipelineState),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid image payload: {0}")]
    InvalidImage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ForgeError>;

impl ForgeError {
    /// Whether this error should be surfaced in the log stream.
    ///
    /// Precondition and busy rejections leave the session untouched and are not logged.
    pub fn is_recoverable_failure(&self) -> bool {
        !matches!(self, ForgeError::Precondition(_) | ForgeError::Busy(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_error_displays_reason_only() {
        let err = ForgeError::Generation("quota exceeded".to_string());
        assert_eq!(err.to_string(), "quota exceeded");

        let err = ForgeError::Busy(PipelineState::Refining);
        assert_eq!(err.to_string(), "Forge is busy (refining)");
    }

    #[test]
    fn guard_errors_are_not_logged_failures() {
        assert!(!ForgeError::Precondition("no result").is_recoverable_failure());
        assert!(!ForgeError::Busy(PipelineState::Scanning).is_recoverable_failure());
        assert!(ForgeError::Cancelled.is_recoverable_failure());
    }
}
