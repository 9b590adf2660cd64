//! # Forge Configuration
//!
//! Pacing, credits and model selection for a forge session.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::ModelConfig;
use crate::state::DEFAULT_LOG_CAPACITY;

/// Name of the starter template the forge produces
pub const STARTER_NAME: &str = "pageai-pro-vibe-coding-starter";

/// Configuration for the coordinator and session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Pause after an agent is activated (ms)
    pub activation_delay_ms: u64,
    /// Pause after an agent's description is logged (ms)
    pub certification_delay_ms: u64,
    /// Credits charged per successful analysis
    pub analysis_cost: i64,
    /// Credits a new session starts with
    pub starting_credits: i64,
    /// Console lines retained
    pub log_capacity: usize,
    /// Starter template name used in the console
    pub starter_name: String,
    /// Gemini model used for analysis and refinement
    pub analysis_model: String,
    /// Model used by the chat assistant
    pub chat: ModelConfig,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            activation_delay_ms: 600,
            certification_delay_ms: 400,
            analysis_cost: 50,
            starting_credits: 2412,
            log_capacity: DEFAULT_LOG_CAPACITY,
            starter_name: STARTER_NAME.to_string(),
            analysis_model: "gemini-3-pro-preview".to_string(),
            chat: ModelConfig::default(),
        }
    }
}

impl ForgeConfig {
    pub fn activation_delay(&self) -> Duration {
        Duration::from_millis(self.activation_delay_ms)
    }

    pub fn certification_delay(&self) -> Duration {
        Duration::from_millis(self.certification_delay_ms)
    }
}
