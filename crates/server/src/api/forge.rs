//! # Forge API
//!
//! Endpoints that drive the coordinator: run, refine, cancel, result, export
//! and the live event stream.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post, put},
    Router,
};
use futures::stream::{self, Stream};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use vanguard_core::export::build_archive;
use vanguard_core::state::SessionSnapshot;
use vanguard_core::swarm::{roster, AgentDescriptor};

use super::ApiResponse;
use crate::SharedState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RunRequest {
    /// Screenshot as a data URL or bare base64
    pub image: String,
    /// Extra context for the analysis; the search query is used when absent
    #[serde(default)]
    pub instruction: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefineRequest {
    pub instruction: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryRequest {
    pub query: String,
}

pub fn forge_routes() -> Router<SharedState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/roster", get(get_roster))
        .route("/run", post(run_forge))
        .route("/refine", post(refine_forge))
        .route("/cancel", post(cancel_forge))
        .route("/query", put(set_query))
        .route("/result", get(get_result))
        .route("/export", get(export_archive))
        .route("/events", get(events))
}

/// Drop the flow's token unless a newer flow has replaced it
async fn release_token(state: &SharedState, token: &Arc<CancellationToken>) {
    let mut slot = state.cancel.write().await;
    if slot
        .as_ref()
        .is_some_and(|current| Arc::ptr_eq(current, token))
    {
        *slot = None;
    }
}

/// Start a refinement in the background, unless there is nothing to refine or a flow is in flight
pub async fn spawn_refine(state: SharedState, instruction: String) -> ApiResponse {
    // Held until the token is installed, so a cancel never sees a stale flow
    let mut slot = state.cancel.write().await;
    let pending = match state.coordinator.begin_refine(&instruction).await {
        Ok(pending) => pending,
        Err(e) => {
            if e.is_recoverable_failure() {
                tracing::warn!("Refinement rejected: {}", e);
            }
            return ApiResponse::rejected(e.to_string());
        }
    };
    let token = Arc::new(CancellationToken::new());
    *slot = Some(token.clone());
    drop(slot);

    tokio::spawn(async move {
        match state.coordinator.execute_refine(pending, &token).await {
            Ok(result) => tracing::info!(files = result.file_count(), "Refinement finished"),
            Err(e) => tracing::warn!("Refinement failed: {}", e),
        }
        release_token(&state, &token).await;
    });
    ApiResponse::ok("Refinement started")
}

/// Get the session snapshot
#[utoipa::path(
    get,
    path = "/api/v1/forge/status",
    tag = "forge",
    responses(
        (status = 200, description = "Pipeline state, agent progress, credits and console")
    )
)]
pub async fn get_status(State(state): State<SharedState>) -> Json<SessionSnapshot> {
    Json(state.coordinator.snapshot().await)
}

/// List the agent roster in pipeline order
#[utoipa::path(
    get,
    path = "/api/v1/forge/roster",
    tag = "forge",
    responses(
        (status = 200, description = "The 16 forge agents")
    )
)]
pub async fn get_roster() -> Json<&'static [AgentDescriptor]> {
    Json(roster())
}

/// Start a forge run on a screenshot
#[utoipa::path(
    post,
    path = "/api/v1/forge/run",
    tag = "forge",
    request_body = RunRequest,
    responses(
        (status = 200, description = "Run started or rejected", body = ApiResponse)
    )
)]
pub async fn run_forge(
    State(state): State<SharedState>,
    Json(req): Json<RunRequest>,
) -> Json<ApiResponse> {
    let instruction = req.instruction.unwrap_or_default();

    // The session moves to Scanning before the request is acknowledged
    let mut slot = state.cancel.write().await;
    let pending = match state.coordinator.begin_run(&req.image, &instruction).await {
        Ok(pending) => pending,
        Err(e) => {
            if e.is_recoverable_failure() {
                tracing::warn!("Forge run rejected: {}", e);
            }
            return Json(ApiResponse::rejected(e.to_string()));
        }
    };
    let token = Arc::new(CancellationToken::new());
    *slot = Some(token.clone());
    drop(slot);

    tokio::spawn(async move {
        match state.coordinator.execute_run(pending, &token).await {
            Ok(result) => tracing::info!(files = result.file_count(), "Forge run finished"),
            Err(e) => tracing::warn!("Forge run failed: {}", e),
        }
        release_token(&state, &token).await;
    });

    Json(ApiResponse::ok("Protocol INFINITY engaged"))
}

/// Refine the current result
#[utoipa::path(
    post,
    path = "/api/v1/forge/refine",
    tag = "forge",
    request_body = RefineRequest,
    responses(
        (status = 200, description = "Refinement started or ignored", body = ApiResponse)
    )
)]
pub async fn refine_forge(
    State(state): State<SharedState>,
    Json(req): Json<RefineRequest>,
) -> Json<ApiResponse> {
    Json(spawn_refine(state, req.instruction).await)
}

/// Cancel the in-flight run or refinement
#[utoipa::path(
    post,
    path = "/api/v1/forge/cancel",
    tag = "forge",
    responses(
        (status = 200, description = "Cancellation requested", body = ApiResponse)
    )
)]
pub async fn cancel_forge(State(state): State<SharedState>) -> Json<ApiResponse> {
    match state.cancel.write().await.take() {
        Some(token) => {
            token.cancel();
            Json(ApiResponse::ok("Cancellation requested"))
        }
        None => Json(ApiResponse::rejected("Nothing to cancel")),
    }
}

/// Capture the search query used by runs without an instruction
#[utoipa::path(
    put,
    path = "/api/v1/forge/query",
    tag = "forge",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Query stored", body = ApiResponse)
    )
)]
pub async fn set_query(
    State(state): State<SharedState>,
    Json(req): Json<QueryRequest>,
) -> Json<ApiResponse> {
    state.coordinator.set_search_query(req.query).await;
    Json(ApiResponse::ok("Query stored"))
}

/// Get the current analysis result
#[utoipa::path(
    get,
    path = "/api/v1/forge/result",
    tag = "forge",
    responses(
        (status = 200, description = "Tokens, documents, project files and metrics"),
        (status = 404, description = "No forge yet")
    )
)]
pub async fn get_result(State(state): State<SharedState>) -> Response {
    match state.coordinator.current_result().await {
        Some(result) => Json(result.as_ref().clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "No forge yet").into_response(),
    }
}

/// Download the current result as a zip archive
#[utoipa::path(
    get,
    path = "/api/v1/forge/export",
    tag = "forge",
    responses(
        (status = 200, description = "Zip archive", content_type = "application/zip"),
        (status = 204, description = "No result to export")
    )
)]
pub async fn export_archive(State(state): State<SharedState>) -> Response {
    let current = state.coordinator.current_result().await;
    match build_archive(current.as_deref()) {
        Ok(Some(archive)) => (
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", archive.file_name),
                ),
            ],
            archive.bytes,
        )
            .into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to build archive: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to build archive: {}", e),
            )
                .into_response()
        }
    }
}

/// SSE endpoint for forge events with heartbeat
pub async fn events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_tx.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match tokio::time::timeout(Duration::from_secs(15), rx.recv()).await {
                Ok(Ok(event)) => {
                    let json = serde_json::to_string(&event).unwrap_or_default();
                    return Some((Ok(Event::default().data(json)), rx));
                }
                // Slow subscriber dropped some events; keep streaming
                Ok(Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::debug!(skipped, "SSE subscriber lagged");
                    continue;
                }
                Ok(Err(_)) => return None,
                Err(_) => return Some((Ok(Event::default().comment("heartbeat")), rx)),
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::{broadcast, Notify};

    use vanguard_core::chat::ChatAssistant;
    use vanguard_core::config::ForgeConfig;
    use vanguard_core::generator::{ContentGenerator, ImagePayload};
    use vanguard_core::models::ModelConfig;
    use vanguard_core::state::{AnalysisResult, GeneratedContent, RefinedContent, Session};
    use vanguard_core::swarm::{Coordinator, InstantPacer, PipelineState};

    use crate::AppState;

    const IMAGE: &str = "data:image/png;base64,iVBORw0KGgo";

    /// Generator that answers only once the gate is opened
    struct Gated {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl ContentGenerator for Gated {
        async fn analyze(
            &self,
            _: &ImagePayload,
            _: &str,
        ) -> vanguard_core::Result<GeneratedContent> {
            self.gate.notified().await;
            Ok(GeneratedContent::default())
        }

        async fn refine(
            &self,
            _: &ImagePayload,
            _: &AnalysisResult,
            _: &str,
        ) -> vanguard_core::Result<RefinedContent> {
            self.gate.notified().await;
            Ok(RefinedContent::default())
        }

        fn model_name(&self) -> &str {
            "gated"
        }
    }

    fn app(gate: Arc<Notify>) -> SharedState {
        let config = ForgeConfig::default();
        let session = Session::new(&config).shared();
        let coordinator = Coordinator::new(config, session, Arc::new(Gated { gate }))
            .with_pacer(Arc::new(InstantPacer::new()));
        let (event_tx, _) = broadcast::channel(16);
        let chat = ChatAssistant::with_model(ModelConfig::default());
        Arc::new(AppState::new(coordinator, event_tx, chat))
    }

    fn run_request(instruction: &str) -> Json<RunRequest> {
        Json(RunRequest {
            image: IMAGE.to_string(),
            instruction: Some(instruction.to_string()),
        })
    }

    async fn wait_until<F>(state: &SharedState, done: F)
    where
        F: Fn(&SessionSnapshot) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !done(&state.coordinator.snapshot().await) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("forge did not settle");
    }

    async fn wait_for_release(state: &SharedState) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while state.cancel.read().await.is_some() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("token was not released");
    }

    #[tokio::test]
    async fn test_second_run_rejected_and_cancel_reaches_first() {
        let state = app(Arc::new(Notify::new()));

        let first = run_forge(State(state.clone()), run_request("first")).await;
        assert!(first.0.success);
        assert_eq!(
            state.coordinator.snapshot().await.state,
            PipelineState::Scanning
        );

        let second = run_forge(State(state.clone()), run_request("second")).await;
        assert!(!second.0.success);
        assert_eq!(second.0.message, "Forge is busy (scanning)");

        let cancelled = cancel_forge(State(state.clone())).await;
        assert!(cancelled.0.success);
        wait_until(&state, |s| s.state == PipelineState::Idle).await;

        let snapshot = state.coordinator.snapshot().await;
        assert!(!snapshot.has_result);
        assert!(snapshot
            .logs
            .iter()
            .any(|l| l.message == "CRITICAL FAILURE: Operation cancelled"));

        let idle = cancel_forge(State(state)).await;
        assert!(!idle.0.success);
    }

    #[tokio::test]
    async fn test_finished_run_releases_token() {
        let gate = Arc::new(Notify::new());
        gate.notify_one();
        let state = app(gate);

        assert!(run_forge(State(state.clone()), run_request("x")).await.0.success);
        wait_until(&state, |s| s.state == PipelineState::Result).await;
        wait_for_release(&state).await;

        let response = cancel_forge(State(state.clone())).await;
        assert_eq!(response.0.message, "Nothing to cancel");

        let archive = export_archive(State(state)).await;
        assert_eq!(archive.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_refine_cancel_keeps_result() {
        let gate = Arc::new(Notify::new());
        gate.notify_one();
        let state = app(gate);

        run_forge(State(state.clone()), run_request("x")).await;
        wait_until(&state, |s| s.state == PipelineState::Result).await;
        let before = state.coordinator.current_result().await.unwrap();

        let refine = |instruction: &str| {
            refine_forge(
                State(state.clone()),
                Json(RefineRequest {
                    instruction: instruction.to_string(),
                }),
            )
        };
        assert!(refine("Make it blue").await.0.success);
        let busy = refine("Make it red").await;
        assert!(!busy.0.success);
        assert_eq!(busy.0.message, "Forge is busy (refining)");
        assert!(!run_forge(State(state.clone()), run_request("y")).await.0.success);

        assert!(cancel_forge(State(state.clone())).await.0.success);
        wait_until(&state, |s| !s.busy).await;

        let snapshot = state.coordinator.snapshot().await;
        assert_eq!(snapshot.state, PipelineState::Result);
        assert_eq!(
            snapshot.logs.last().map(|l| l.message.as_str()),
            Some("Refinement error: Operation cancelled")
        );
        let current = state.coordinator.current_result().await.unwrap();
        assert!(Arc::ptr_eq(&current, &before));
    }

    #[tokio::test]
    async fn test_no_result_responses() {
        let state = app(Arc::new(Notify::new()));

        let archive = export_archive(State(state.clone())).await;
        assert_eq!(archive.status(), StatusCode::NO_CONTENT);

        let result = get_result(State(state.clone())).await;
        assert_eq!(result.status(), StatusCode::NOT_FOUND);

        let refine = refine_forge(
            State(state.clone()),
            Json(RefineRequest {
                instruction: "Make it blue".to_string(),
            }),
        )
        .await;
        assert!(!refine.0.success);
        assert!(state.cancel.read().await.is_none());

        let snapshot = state.coordinator.snapshot().await;
        assert_eq!(snapshot.state, PipelineState::Idle);
        assert!(snapshot.logs.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_image_is_rejected() {
        let state = app(Arc::new(Notify::new()));
        let response = run_forge(
            State(state.clone()),
            Json(RunRequest {
                image: String::new(),
                instruction: None,
            }),
        )
        .await;

        assert!(!response.0.success);
        assert!(state.cancel.read().await.is_none());
        assert_eq!(state.coordinator.snapshot().await.state, PipelineState::Idle);
    }
}
