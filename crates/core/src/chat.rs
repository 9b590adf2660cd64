//! # Chat Assistant
//!
//! Conversation with the forge operator. A message asking for a change is
//! turned into a refinement instruction; everything else gets a short answer.
//! Failures never propagate, they become a canned reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::ModelConfig;
use crate::skills::{ChatDecision, ChatSkill};
use crate::state::DesignTokens;

pub const GREETING: &str =
    "Vanguard Intelligence online. I am your Control Tower. How can I refine your forge?";
pub const FAILURE_REPLY: &str = "Neural link interrupted. Please try again.";
const FALLBACK_REPLY: &str = "Understood.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// What the host should do after a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatOutcome {
    /// Plain answer
    Reply { reply: String },
    /// Answer plus a refinement to trigger
    Refine { reply: String, instruction: String },
    /// Empty input, nothing happened
    Ignored,
}

impl ChatOutcome {
    pub fn reply(&self) -> Option<&str> {
        match self {
            ChatOutcome::Reply { reply } | ChatOutcome::Refine { reply, .. } => Some(reply),
            ChatOutcome::Ignored => None,
        }
    }
}

/// Backend that answers a single message
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn respond(
        &self,
        message: &str,
        tokens: Option<&DesignTokens>,
    ) -> anyhow::Result<ChatDecision>;
}

/// [`ChatResponder`] backed by the radkit chat skill
pub struct SkillResponder {
    config: ModelConfig,
}

impl SkillResponder {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ChatResponder for SkillResponder {
    async fn respond(
        &self,
        message: &str,
        tokens: Option<&DesignTokens>,
    ) -> anyhow::Result<ChatDecision> {
        ChatSkill::run(message, tokens, &self.config).await
    }
}

pub struct ChatAssistant {
    responder: Box<dyn ChatResponder>,
    history: Vec<ChatMessage>,
}

impl ChatAssistant {
    pub fn new(responder: Box<dyn ChatResponder>) -> Self {
        Self {
            responder,
            history: vec![ChatMessage::model(GREETING)],
        }
    }

    pub fn with_model(config: ModelConfig) -> Self {
        Self::new(Box::new(SkillResponder::new(config)))
    }

    /// Swap the responder, keeping the conversation
    pub fn set_responder(&mut self, responder: Box<dyn ChatResponder>) {
        self.responder = responder;
    }

    /// Switch to another chat model, keeping the conversation
    pub fn set_model(&mut self, config: ModelConfig) {
        self.set_responder(Box::new(SkillResponder::new(config)));
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Send one message. `tokens` is the current forge context, if any.
    pub async fn send(&mut self, input: &str, tokens: Option<&DesignTokens>) -> ChatOutcome {
        let message = input.trim();
        if message.is_empty() {
            return ChatOutcome::Ignored;
        }
        self.history.push(ChatMessage::user(message));

        let outcome = match self.responder.respond(message, tokens).await {
            Ok(decision) => match decision.instruction() {
                Some(instruction) => ChatOutcome::Refine {
                    reply: format!(
                        "Received. Forwarding the instruction to the agents: \"{}\". Launching the pipeline...",
                        instruction
                    ),
                    instruction: instruction.to_string(),
                },
                None if decision.reply.trim().is_empty() => ChatOutcome::Reply {
                    reply: FALLBACK_REPLY.to_string(),
                },
                None => ChatOutcome::Reply {
                    reply: decision.reply,
                },
            },
            Err(e) => {
                tracing::warn!("Chat request failed: {:#}", e);
                ChatOutcome::Reply {
                    reply: FAILURE_REPLY.to_string(),
                }
            }
        };

        if let Some(reply) = outcome.reply() {
            self.history.push(ChatMessage::model(reply));
        }
        outcome
    }
}
