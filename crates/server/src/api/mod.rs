//! # Vanguard API
//!
//! HTTP handlers, grouped by surface. Routes are mounted under `/api/v1` in `main.rs`.

pub mod chat;
pub mod config;
pub mod forge;

use serde::Serialize;
use utoipa::ToSchema;

/// Generic acknowledgement
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
