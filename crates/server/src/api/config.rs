//! # Config API
//!
//! Persisted overrides on top of [`ForgeConfig`] defaults, stored in
//! `.vanguard/config.json` and merged field by field on `PATCH`.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

use vanguard_core::config::ForgeConfig;
use vanguard_core::models::{LlmProvider, ModelConfig};

use crate::SharedState;

pub const CONFIG_PATH: &str = ".vanguard/config.json";

/// Persisted configuration (the subset of `ForgeConfig` exposed to the frontend)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, ToSchema)]
pub struct PersistedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification_delay_ms: Option<u64>,
}

impl PersistedConfig {
    pub async fn load() -> Self {
        Self::load_from(Path::new(CONFIG_PATH)).await
    }

    pub async fn load_from(path: &Path) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub async fn save(&self) -> anyhow::Result<()> {
        self.save_to(&PathBuf::from(CONFIG_PATH)).await
    }

    pub async fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    pub fn merge(&mut self, other: PersistedConfig) {
        if other.analysis_model.is_some() {
            self.analysis_model = other.analysis_model;
        }
        if other.chat_provider.is_some() {
            self.chat_provider = other.chat_provider;
        }
        if other.chat_model.is_some() {
            self.chat_model = other.chat_model;
        }
        if other.chat_base_url.is_some() {
            self.chat_base_url = other.chat_base_url;
        }
        if other.activation_delay_ms.is_some() {
            self.activation_delay_ms = other.activation_delay_ms;
        }
        if other.certification_delay_ms.is_some() {
            self.certification_delay_ms = other.certification_delay_ms;
        }
    }

    /// Chat model selection, falling back to the provider's default model
    pub fn chat_model_config(&self) -> ModelConfig {
        let provider = self
            .chat_provider
            .as_deref()
            .and_then(LlmProvider::from_name)
            .unwrap_or_default();
        let mut config = match &self.chat_model {
            Some(model) => ModelConfig::with_provider(provider, model.clone()),
            None => ModelConfig::for_provider(provider),
        };
        if let Some(url) = &self.chat_base_url {
            config = config.with_base_url(url.clone());
        }
        config
    }

    /// Overlay the persisted values on `base`
    pub fn apply(&self, mut base: ForgeConfig) -> ForgeConfig {
        if let Some(model) = &self.analysis_model {
            base.analysis_model = model.clone();
        }
        if let Some(ms) = self.activation_delay_ms {
            base.activation_delay_ms = ms;
        }
        if let Some(ms) = self.certification_delay_ms {
            base.certification_delay_ms = ms;
        }
        base.chat = self.chat_model_config();
        base
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigResponse {
    config: PersistedConfig,
    defaults: ConfigDefaults,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigDefaults {
    analysis_model: String,
    chat_provider: &'static str,
    chat_model: String,
    activation_delay_ms: u64,
    certification_delay_ms: u64,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        let config = ForgeConfig::default();
        Self {
            analysis_model: config.analysis_model,
            chat_provider: config.chat.provider.as_str(),
            chat_model: config.chat.model,
            activation_delay_ms: config.activation_delay_ms,
            certification_delay_ms: config.certification_delay_ms,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderInfo {
    id: &'static str,
    name: &'static str,
    default_model: &'static str,
    supports_base_url: bool,
    env_var: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProvidersResponse {
    providers: Vec<ProviderInfo>,
}

fn provider_info() -> Vec<ProviderInfo> {
    LlmProvider::all()
        .iter()
        .map(|p| ProviderInfo {
            id: p.as_str(),
            name: p.display_name(),
            default_model: p.default_model(),
            supports_base_url: p.supports_base_url(),
            env_var: p.env_var(),
        })
        .collect()
}

/// Get current configuration
#[utoipa::path(
    get,
    path = "/api/v1/config",
    tag = "config",
    responses(
        (status = 200, description = "Current configuration and defaults", body = ConfigResponse)
    )
)]
pub async fn get_config() -> Json<ConfigResponse> {
    let config = PersistedConfig::load().await;
    Json(ConfigResponse {
        config,
        defaults: ConfigDefaults::default(),
    })
}

/// Update configuration (partial merge)
///
/// The chat model switches immediately. Pacing and the analysis model apply on restart.
#[utoipa::path(
    patch,
    path = "/api/v1/config",
    tag = "config",
    request_body = PersistedConfig,
    responses(
        (status = 200, description = "Updated configuration", body = ConfigResponse)
    )
)]
pub async fn update_config(
    State(state): State<SharedState>,
    Json(updates): Json<PersistedConfig>,
) -> Json<ConfigResponse> {
    let mut config = PersistedConfig::load().await;
    let chat_changed = updates.chat_provider.is_some()
        || updates.chat_model.is_some()
        || updates.chat_base_url.is_some();
    config.merge(updates);

    if let Err(e) = config.save().await {
        tracing::error!("Failed to save config: {:#}", e);
    }

    if chat_changed {
        let model = config.chat_model_config();
        tracing::info!(provider = model.provider.as_str(), model = %model.model, "Chat model switched");
        state.chat.lock().await.set_model(model);
    }

    Json(ConfigResponse {
        config,
        defaults: ConfigDefaults::default(),
    })
}

/// Get available LLM providers
#[utoipa::path(
    get,
    path = "/api/v1/providers",
    tag = "providers",
    responses(
        (status = 200, description = "List of supported LLM providers", body = ProvidersResponse)
    )
)]
pub async fn get_providers() -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: provider_info(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_only_overrides_present_fields() {
        let mut config = PersistedConfig {
            analysis_model: Some("gemini-3-pro-preview".to_string()),
            activation_delay_ms: Some(100),
            ..Default::default()
        };
        config.merge(PersistedConfig {
            activation_delay_ms: Some(0),
            chat_provider: Some("openai".to_string()),
            ..Default::default()
        });

        assert_eq!(config.analysis_model.as_deref(), Some("gemini-3-pro-preview"));
        assert_eq!(config.activation_delay_ms, Some(0));
        assert_eq!(config.chat_provider.as_deref(), Some("openai"));
    }

    #[test]
    fn test_apply_overlays_defaults() {
        let persisted = PersistedConfig {
            chat_provider: Some("OpenAI".to_string()),
            chat_base_url: Some("http://localhost:1234/v1".to_string()),
            certification_delay_ms: Some(0),
            ..Default::default()
        };
        let config = persisted.apply(ForgeConfig::default());

        assert_eq!(config.chat.provider, LlmProvider::OpenAI);
        assert_eq!(config.chat.model, "gpt-4o");
        assert_eq!(config.chat.base_url.as_deref(), Some("http://localhost:1234/v1"));
        assert_eq!(config.certification_delay_ms, 0);
        assert_eq!(config.activation_delay_ms, 600);
    }

    #[test]
    fn test_unknown_provider_falls_back_to_gemini() {
        let persisted = PersistedConfig {
            chat_provider: Some("mistral".to_string()),
            ..Default::default()
        };
        assert_eq!(persisted.chat_model_config(), ModelConfig::default());
    }

    #[test]
    fn test_provider_info_covers_all() {
        let providers = provider_info();
        assert_eq!(providers.len(), LlmProvider::all().len());
        assert!(providers.iter().any(|p| p.id == "gemini" && p.env_var == "GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("vanguard-config-{}", std::process::id()));
        let path = dir.join("config.json");
        let config = PersistedConfig {
            chat_model: Some("gemini-3-flash-preview".to_string()),
            ..Default::default()
        };

        config.save_to(&path).await.unwrap();
        assert_eq!(PersistedConfig::load_from(&path).await, config);

        tokio::fs::write(&path, "not json").await.unwrap();
        assert_eq!(PersistedConfig::load_from(&path).await, PersistedConfig::default());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
