//! # Session State
//!
//! Result store, console log and per-session progress.

pub mod logs;
pub mod result;
pub mod session;

pub use logs::{LogBuffer, DEFAULT_LOG_CAPACITY};
pub use result::{
    AnalysisResult, ColorTokens, DesignTokens, GeneratedContent, Metrics, ProjectFile,
    RadiusTokens, RefinedContent, SpacingTokens, TypographyTokens, CONFIDENCE, MANIFESTO_PATH,
    RULES_PATH,
};
pub use session::{Session, SessionSnapshot, SharedSession};
