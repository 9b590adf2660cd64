//! # Vanguard Models
//!
//! LLM provider selection for the chat assistant.
//! The content generator talks to Gemini directly (see `generator::gemini`).

use serde::{Deserialize, Serialize};

/// Supported LLM providers
///
/// Each provider reads its key from the environment:
/// - Anthropic (Claude) - `ANTHROPIC_API_KEY`
/// - OpenAI (GPT) - `OPENAI_API_KEY`
/// - Gemini (Google) - `GEMINI_API_KEY`
/// - OpenRouter (Gateway) - `OPENROUTER_API_KEY`
/// - Grok (xAI) - `XAI_API_KEY`
/// - DeepSeek - `DEEPSEEK_API_KEY`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    #[default]
    Gemini,
    OpenRouter,
    Grok,
    DeepSeek,
}

impl LlmProvider {
    /// Get all available providers
    pub fn all() -> Vec<LlmProvider> {
        vec![
            LlmProvider::Anthropic,
            LlmProvider::OpenAI,
            LlmProvider::Gemini,
            LlmProvider::OpenRouter,
            LlmProvider::Grok,
            LlmProvider::DeepSeek,
        ]
    }

    /// Parse a provider name as sent by the UI
    pub fn from_name(name: &str) -> Option<LlmProvider> {
        match name.to_ascii_lowercase().as_str() {
            "anthropic" => Some(LlmProvider::Anthropic),
            "openai" => Some(LlmProvider::OpenAI),
            "gemini" => Some(LlmProvider::Gemini),
            "openrouter" => Some(LlmProvider::OpenRouter),
            "grok" => Some(LlmProvider::Grok),
            "deepseek" => Some(LlmProvider::DeepSeek),
            _ => None,
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::Gemini => "Gemini",
            LlmProvider::OpenRouter => "OpenRouter",
            LlmProvider::Grok => "Grok",
            LlmProvider::DeepSeek => "DeepSeek",
        }
    }

    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "claude-sonnet-4-20250514",
            LlmProvider::OpenAI => "gpt-4o",
            LlmProvider::Gemini => "gemini-3-flash-preview",
            LlmProvider::OpenRouter => "anthropic/claude-3.5-sonnet",
            LlmProvider::Grok => "grok-2",
            LlmProvider::DeepSeek => "deepseek-chat",
        }
    }

    /// Environment variable holding the API key
    pub fn env_var(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
            LlmProvider::Grok => "XAI_API_KEY",
            LlmProvider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    /// Wire name, as accepted by [`LlmProvider::from_name`]
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Gemini => "gemini",
            LlmProvider::OpenRouter => "openrouter",
            LlmProvider::Grok => "grok",
            LlmProvider::DeepSeek => "deepseek",
        }
    }

    /// Whether this provider supports custom base URL
    pub fn supports_base_url(&self) -> bool {
        matches!(self, LlmProvider::OpenAI)
    }
}

/// Configuration for LLM model selection
///
/// ## Example
/// ```rust,ignore
/// use vanguard_core::models::{ModelConfig, LlmProvider};
///
/// // Default Gemini flash model for chat
/// let config = ModelConfig::default();
///
/// // Specific provider and model
/// let config = ModelConfig::with_provider(LlmProvider::OpenAI, "gpt-4o");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// LLM provider to use
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name (e.g., "gemini-3-flash-preview", "gpt-4o")
    pub model: String,
    /// Optional base URL override for OpenAI-compatible APIs
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::for_provider(LlmProvider::Gemini)
    }
}

impl ModelConfig {
    /// Create a new model config with the default provider (Gemini)
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_provider(LlmProvider::Gemini, model)
    }

    /// Create config for a specific provider
    pub fn with_provider(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            base_url: None,
        }
    }

    /// Provider with its default model
    pub fn for_provider(provider: LlmProvider) -> Self {
        let model = provider.default_model();
        Self::with_provider(provider, model)
    }

    /// Set base URL (ignored by providers that don't support it)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if self.provider.supports_base_url() {
            self.base_url = Some(url.into());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.provider, LlmProvider::Gemini);
        assert!(config.model.contains("gemini"));
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(LlmProvider::from_name("OpenAI"), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::from_name("mistral"), None);
        assert_eq!(LlmProvider::Gemini.display_name(), "Gemini");
        for provider in LlmProvider::all() {
            assert_eq!(LlmProvider::from_name(provider.as_str()), Some(provider));
        }
        assert_eq!(LlmProvider::Grok.env_var(), "XAI_API_KEY");
    }

    #[test]
    fn test_base_url_only_for_openai() {
        let gemini = ModelConfig::default().with_base_url("http://localhost:1234");
        assert!(gemini.base_url.is_none());

        let openai = ModelConfig::for_provider(LlmProvider::OpenAI)
            .with_base_url("http://localhost:1234");
        assert_eq!(openai.base_url.as_deref(), Some("http://localhost:1234"));
    }

    #[test]
    fn test_model_config_serialization() {
        let config = ModelConfig::with_provider(LlmProvider::OpenAI, "gpt-4o");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("openai"));
        assert!(json.contains("gpt-4o"));
    }
}
