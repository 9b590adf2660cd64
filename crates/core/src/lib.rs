//! # Vanguard Core
//!
//! The forge engine: turns a UI screenshot into design tokens, documents and a
//! starter project by walking a 16-agent roster and calling a content generator.
//!
//! ## Architecture
//!
//! - `swarm/` - Agent roster, pipeline state machine and the coordinator
//! - `state/` - Session, console log and analysis results
//! - `generator/` - Content generator trait and the Gemini client
//! - `skills/` - radkit skills (chat decision)
//! - `chat` - Chat assistant that can trigger refinements
//! - `export` - Zip archive of the current result
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use vanguard_core::{config::ForgeConfig, generator::GeminiGenerator, state::Session, swarm::Coordinator};
//!
//! let config = ForgeConfig::default();
//! let generator = GeminiGenerator::from_env(&config.analysis_model)?;
//! let session = Session::new(&config).shared();
//! let coordinator = Coordinator::new(config, session, Arc::new(generator));
//! let result = coordinator.run(data_url, "", &CancellationToken::new()).await?;
//! ```

pub mod chat;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod models;
pub mod skills;
pub mod state;
pub mod swarm;

pub use error::{ForgeError, Result};
