//! # Content Generation
//!
//! The external model that turns a screenshot into tokens, documents and code.
//!
//! ```text
//! analyze(image, instruction)          → GeneratedContent
//! refine(image, current, instruction)  → RefinedContent (partial)
//! ```

pub mod gemini;
pub mod image;
pub mod prompts;

use async_trait::async_trait;

use crate::error::Result;
use crate::state::{AnalysisResult, GeneratedContent, RefinedContent};

pub use gemini::GeminiGenerator;
pub use image::ImagePayload;

/// Produces forge artifacts from a screenshot
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Full analysis of a screenshot
    async fn analyze(&self, image: &ImagePayload, instruction: &str) -> Result<GeneratedContent>;

    /// Partial update of an existing result
    async fn refine(
        &self,
        image: &ImagePayload,
        current: &AnalysisResult,
        instruction: &str,
    ) -> Result<RefinedContent>;

    /// Model identifier, for logs
    fn model_name(&self) -> &str;
}
