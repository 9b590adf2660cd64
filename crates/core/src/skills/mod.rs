//! # Vanguard Skills
//!
//! radkit-backed LLM skills. The chat assistant is the only one; the content
//! generator talks to Gemini over REST (see `generator::gemini`).

pub mod chat_skill;
pub mod llm_helpers;

pub use chat_skill::{ChatDecision, ChatSkill};
