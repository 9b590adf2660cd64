//! # Chat Skill
//!
//! Answers the operator and decides whether a message asks for a refinement.

use crate::models::ModelConfig;
use crate::run_llm_function;
use crate::state::DesignTokens;
use radkit::macros::LLMOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured answer of the chat model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, LLMOutput)]
pub struct ChatDecision {
    /// Text shown to the operator
    pub reply: String,
    /// Instruction for the refinement pipeline, when the message asks for a change
    #[serde(default)]
    pub refine_instruction: Option<String>,
}

impl ChatDecision {
    /// The refinement instruction, ignoring blank values
    pub fn instruction(&self) -> Option<&str> {
        self.refine_instruction
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

pub struct ChatSkill;

impl ChatSkill {
    pub async fn run(
        message: &str,
        tokens: Option<&DesignTokens>,
        config: &ModelConfig,
    ) -> anyhow::Result<ChatDecision> {
        let prompt = build_prompt(message, tokens);
        run_llm_function!(config, ChatDecision, SYSTEM_PROMPT, prompt)
    }
}

fn build_prompt(message: &str, tokens: Option<&DesignTokens>) -> String {
    let context = tokens
        .and_then(|t| serde_json::to_string(t).ok())
        .unwrap_or_else(|| "No active forge yet".to_string());
    format!("CURRENT CONTEXT: {}\n\nUser message:\n{}", context, message)
}

const SYSTEM_PROMPT: &str = include_str!("defaults/chat.md");
