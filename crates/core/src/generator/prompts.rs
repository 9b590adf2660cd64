//! Prompt templates bundled at compile time.

use crate::state::DesignTokens;

/// Full analysis prompt, `{context}` is replaced with the user instruction
pub const ANALYZE: &str = include_str!("defaults/analyze.md");

/// Refinement prompt, `{instruction}` and `{tokens}` are replaced
pub const REFINE: &str = include_str!("defaults/refine.md");

/// Utility module prepended to every generated project
pub const FOUNDRY_UTILS: &str = include_str!("defaults/foundry-utils.ts");

/// Path of [`FOUNDRY_UTILS`] inside the project
pub const FOUNDRY_UTILS_PATH: &str = "lib/foundry-utils.ts";

pub fn analyze_prompt(context: &str) -> String {
    ANALYZE.replace("{context}", context)
}

pub fn refine_prompt(instruction: &str, tokens: &DesignTokens) -> String {
    let tokens = serde_json::to_string(tokens).unwrap_or_else(|_| "{}".to_string());
    // Instruction last so its text is never rescanned for placeholders
    REFINE
        .replace("{tokens}", &tokens)
        .replace("{instruction}", instruction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_non_empty() {
        for (name, content) in [("analyze", ANALYZE), ("refine", REFINE)] {
            assert!(content.len() > 50, "Prompt '{}' seems too short", name);
        }
        assert!(FOUNDRY_UTILS.contains("export function cn"));
    }

    #[test]
    fn test_placeholders_are_filled() {
        let prompt = analyze_prompt("Stripe, GDPR");
        assert!(prompt.contains("ADDITIONAL CONTEXT: Stripe, GDPR"));

        let mut tokens = DesignTokens::default();
        tokens.colors.primary = "#E6644C".to_string();
        let prompt = refine_prompt("Make it blue", &tokens);
        assert!(prompt.contains("\"Make it blue\""));
        assert!(prompt.contains("#E6644C"));
        assert!(!prompt.contains("{tokens}"));
    }

    #[test]
    fn test_instruction_placeholders_stay_literal() {
        let prompt = refine_prompt("Rename {tokens} to theme", &DesignTokens::default());
        assert!(prompt.contains("Rename {tokens} to theme"));
    }
}
