//! # LLM Helpers
//!
//! Provider dispatch for radkit clients built from a [`ModelConfig`](crate::models::ModelConfig).

/// Bind a radkit client for the configured provider to `$llm` and evaluate `$body`.
///
/// Expands inside an `async` fn returning `anyhow::Result`; the client
/// constructors read their keys from the environment.
#[macro_export]
macro_rules! with_llm {
    ($config:expr, |$llm:ident| $body:expr) => {{
        use radkit::models::providers::{
            AnthropicLlm, DeepSeekLlm, GeminiLlm, GrokLlm, OpenAILlm, OpenRouterLlm,
        };
        use $crate::models::LlmProvider;

        let config = $config;
        match config.provider {
            LlmProvider::Anthropic => {
                let $llm = AnthropicLlm::from_env(&config.model)?;
                $body
            }
            LlmProvider::OpenAI => {
                let $llm = match &config.base_url {
                    Some(base_url) => OpenAILlm::from_env(&config.model)?.with_base_url(base_url),
                    None => OpenAILlm::from_env(&config.model)?,
                };
                $body
            }
            LlmProvider::Gemini => {
                let $llm = GeminiLlm::from_env(&config.model)?;
                $body
            }
            LlmProvider::OpenRouter => {
                let $llm = OpenRouterLlm::from_env(&config.model)?;
                $body
            }
            LlmProvider::Grok => {
                let $llm = GrokLlm::from_env(&config.model)?;
                $body
            }
            LlmProvider::DeepSeek => {
                let $llm = DeepSeekLlm::from_env(&config.model)?;
                $body
            }
        }
    }};
}

/// Run a structured-output `LlmFunction` against the configured provider.
#[macro_export]
macro_rules! run_llm_function {
    ($config:expr, $output_type:ty, $system_prompt:expr, $input:expr) => {
        $crate::with_llm!($config, |llm| {
            radkit::agent::LlmFunction::<$output_type>::new_with_system_instructions(
                llm,
                $system_prompt,
            )
            .run($input)
            .await
            .map_err(anyhow::Error::from)
        })
    };
}

pub use run_llm_function;
pub use with_llm;
