//! # Chat API
//!
//! The Control Tower conversation. A message that asks for a change triggers
//! a refinement of the current forge.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use vanguard_core::chat::{ChatMessage, ChatOutcome};

use super::forge::spawn_refine;
use crate::SharedState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ChatResponse {
    /// Assistant answer; absent when the message was ignored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    /// Instruction forwarded to the refinement pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refine_instruction: Option<String>,
    /// Empty message, or another message is still in flight
    pub ignored: bool,
}

/// Send a message to the assistant
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse)
    )
)]
pub async fn send_message(
    State(state): State<SharedState>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let Ok(mut chat) = state.chat.try_lock() else {
        return Json(ChatResponse {
            ignored: true,
            ..Default::default()
        });
    };

    let current = state.coordinator.current_result().await;
    let outcome = chat
        .send(&req.message, current.as_ref().map(|r| &r.tokens))
        .await;
    drop(chat);

    let response = match outcome {
        ChatOutcome::Reply { reply } => ChatResponse {
            reply: Some(reply),
            ..Default::default()
        },
        ChatOutcome::Refine { reply, instruction } => {
            let started = spawn_refine(state.clone(), instruction.clone()).await;
            if !started.success {
                tracing::info!("Chat refinement not started: {}", started.message);
            }
            ChatResponse {
                reply: Some(reply),
                refine_instruction: Some(instruction),
                ignored: false,
            }
        }
        ChatOutcome::Ignored => ChatResponse {
            ignored: true,
            ..Default::default()
        },
    };
    Json(response)
}

/// Conversation so far, starting with the greeting
#[utoipa::path(
    get,
    path = "/api/v1/chat/history",
    tag = "chat",
    responses(
        (status = 200, description = "Chat messages, oldest first")
    )
)]
pub async fn get_history(State(state): State<SharedState>) -> Json<Vec<ChatMessage>> {
    Json(state.chat.lock().await.history().to_vec())
}
