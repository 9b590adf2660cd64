//! # Analysis Results
//!
//! Design tokens, generated artifacts and the merge rules used by refinement.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::swarm::roster::ROSTER;

/// Manifesto document synthesized into every result
pub const MANIFESTO_PATH: &str = "FOUNDRY_MANIFESTO.md";
/// Cursor rules document synthesized into every result
pub const RULES_PATH: &str = ".cursor/rules/foundry.mdc";
/// Confidence reported for every successful analysis
pub const CONFIDENCE: f64 = 99.9;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorTokens {
    pub primary: String,
    pub background: String,
    pub surface: String,
    pub text: String,
    pub accent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusTokens {
    pub card: String,
    pub button: String,
    pub input: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypographyTokens {
    pub font_family: String,
    pub base_size: String,
    pub heading_weight: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingTokens {
    pub base: String,
    pub gap: String,
}

/// Design DNA extracted from the screenshot
///
/// Missing groups deserialize to empty values, so a refinement that only
/// returns `colors` replaces the other groups with blanks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignTokens {
    pub colors: ColorTokens,
    pub radii: RadiusTokens,
    pub typography: TypographyTokens,
    pub spacing: SpacingTokens,
}

/// Fixed metrics attached to every result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub symmetry: f64,
    pub tokens: u32,
    pub agents: u32,
    pub latency: String,
    pub compliance: String,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            symmetry: 99.9,
            tokens: 32450,
            agents: ROSTER.len() as u32,
            latency: "142ms".to_string(),
            compliance: "Starter v1.6.0-ELITE".to_string(),
        }
    }
}

/// A generated source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub path: String,
    pub content: String,
}

impl ProjectFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Output of a full analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub tokens: DesignTokens,
    pub spec: String,
    pub rules: String,
    #[serde(default)]
    pub project_files: Vec<ProjectFile>,
}

/// Partial update returned by a refinement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinedContent {
    #[serde(default)]
    pub tokens: Option<DesignTokens>,
    #[serde(default)]
    pub spec: Option<String>,
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default)]
    pub project_files: Vec<ProjectFile>,
}

/// The current artifact set held by the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub tokens: DesignTokens,
    pub markdown_spec: String,
    pub cursor_rules: String,
    /// path → content
    pub project_files: BTreeMap<String, String>,
    pub confidence: f64,
    pub metrics: Metrics,
}

impl AnalysisResult {
    /// Build a result from generator output, synthesizing the manifesto and rules documents
    pub fn from_generated(content: GeneratedContent) -> Self {
        let mut project_files: BTreeMap<String, String> = content
            .project_files
            .into_iter()
            .map(|f| (f.path, f.content))
            .collect();
        project_files.insert(MANIFESTO_PATH.to_string(), content.spec.clone());
        project_files.insert(RULES_PATH.to_string(), content.rules.clone());

        Self {
            tokens: content.tokens,
            markdown_spec: content.spec,
            cursor_rules: content.rules,
            project_files,
            confidence: CONFIDENCE,
            metrics: Metrics::default(),
        }
    }

    /// Apply a refinement, returning a new result
    ///
    /// Top-level fields present in `patch` replace the current ones wholesale.
    /// `project_files` is merged path by path: returned paths overwrite, the rest persist.
    pub fn merged(&self, patch: RefinedContent) -> Self {
        let mut next = self.clone();
        if let Some(tokens) = patch.tokens {
            next.tokens = tokens;
        }
        if let Some(spec) = patch.spec {
            next.markdown_spec = spec;
        }
        if let Some(rules) = patch.rules {
            next.cursor_rules = rules;
        }
        for file in patch.project_files {
            next.project_files.insert(file.path, file.content);
        }
        next
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.project_files.get(path).map(String::as_str)
    }

    pub fn file_count(&self) -> usize {
        self.project_files.len()
    }
}
