//! # Forge Coordinator
//!
//! Drives the agent roster and the content generator for one session.
//!
//! A run walks the roster in order (activate, describe, certify), then asks the
//! generator for the artifacts. A refinement skips the roster and merges a
//! partial update into the current result. Every pause and generator call is a
//! cancellation point.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::ForgeConfig;
use crate::error::{ForgeError, Result};
use crate::generator::{ContentGenerator, ImagePayload};
use crate::state::{AnalysisResult, GeneratedContent, SessionSnapshot, SharedSession};

use super::events::{ForgeEvent, ForgeEventKind, LogEntry, LogStatus};
use super::pacer::{Pacer, TokioPacer};
use super::pipeline::{PipelineState, Transition};
use super::roster::{roster, AgentId};

/// A run that has entered `Scanning` and waits for [`Coordinator::execute_run`]
#[derive(Debug)]
pub struct PendingRun {
    image: ImagePayload,
    instruction: String,
}

/// A refinement that has entered `Refining` and waits for [`Coordinator::execute_refine`]
#[derive(Debug)]
pub struct PendingRefine {
    image: ImagePayload,
    current: Arc<AnalysisResult>,
    instruction: String,
}

/// The forge coordinator
pub struct Coordinator {
    config: ForgeConfig,
    session: SharedSession,
    generator: Arc<dyn ContentGenerator>,
    pacer: Arc<dyn Pacer>,
    event_tx: Option<mpsc::Sender<ForgeEvent>>,
}

impl Coordinator {
    pub fn new(
        config: ForgeConfig,
        session: SharedSession,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        Self {
            config,
            session,
            generator,
            pacer: Arc::new(TokioPacer),
            event_tx: None,
        }
    }

    /// Replace the wall-clock pacer
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Set event channel for observers
    pub fn with_event_channel(mut self, tx: mpsc::Sender<ForgeEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.read().await.snapshot()
    }

    pub async fn current_result(&self) -> Option<Arc<AnalysisResult>> {
        self.session.read().await.current()
    }

    /// Capture the query used when a run has no instruction
    pub async fn set_search_query(&self, query: impl Into<String>) {
        self.session.write().await.set_search_query(query);
    }

    async fn emit(&self, kind: ForgeEventKind) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(ForgeEvent::new(kind)).await;
        }
    }

    async fn emit_all(&self, kinds: impl IntoIterator<Item = ForgeEventKind>) {
        for kind in kinds {
            self.emit(kind).await;
        }
    }

    async fn log(&self, message: impl Into<String>, agent: Option<AgentId>, status: LogStatus) {
        let entry = self.session.write().await.log(message, agent, status);
        self.emit(ForgeEventKind::Log { entry }).await;
    }

    async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ForgeError::Cancelled),
            _ = self.pacer.pause(duration) => Ok(()),
        }
    }

    /// Run the full pipeline on a screenshot.
    ///
    /// `image` is a data URL or raw base64. An empty `instruction` falls back
    /// to the session's search query.
    pub async fn run(
        &self,
        image: &str,
        instruction: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<AnalysisResult>> {
        let pending = self.begin_run(image, instruction).await?;
        self.execute_run(pending, cancel).await
    }

    /// Enter `Scanning` without walking the roster yet.
    ///
    /// The busy check and the transition happen under one write lock. The
    /// returned [`PendingRun`] must be handed to [`Coordinator::execute_run`].
    pub async fn begin_run(&self, image: &str, instruction: &str) -> Result<PendingRun> {
        let image = ImagePayload::parse(image)?;

        let instruction = {
            let mut session = self.session.write().await;
            session.begin_scan(image.clone())?;
            if instruction.trim().is_empty() {
                session.search_query().to_string()
            } else {
                instruction.to_string()
            }
        };
        self.emit(ForgeEventKind::StateChanged {
            state: PipelineState::Scanning,
        })
        .await;
        self.log(
            format!("Protocol INFINITY engaged for {}.", self.config.starter_name),
            None,
            LogStatus::Info,
        )
        .await;

        Ok(PendingRun { image, instruction })
    }

    /// Walk the roster and store the generated result
    #[tracing::instrument(
        skip(self, pending, cancel),
        fields(model = %self.generator.model_name(), instruction = %pending.instruction)
    )]
    pub async fn execute_run(
        &self,
        pending: PendingRun,
        cancel: &CancellationToken,
    ) -> Result<Arc<AnalysisResult>> {
        let PendingRun { image, instruction } = pending;

        match self.scan(&image, &instruction, cancel).await {
            Ok(content) => {
                let result = Arc::new(AnalysisResult::from_generated(content));
                let credits = {
                    let mut session = self.session.write().await;
                    session.store_result(result.clone());
                    let credits = session.spend_credits(self.config.analysis_cost);
                    session.apply(Transition::ScanSucceeded);
                    credits
                };
                self.emit_all([
                    ForgeEventKind::ResultUpdated {
                        files: result.file_count(),
                    },
                    ForgeEventKind::CreditsChanged { credits },
                    ForgeEventKind::StateChanged {
                        state: PipelineState::Result,
                    },
                ])
                .await;
                tracing::info!(files = result.file_count(), credits, "Forge complete");
                Ok(result)
            }
            Err(e) => {
                let entry = {
                    let mut session = self.session.write().await;
                    session.clear_active();
                    let entry =
                        session.log(format!("CRITICAL FAILURE: {}", e), None, LogStatus::Warning);
                    session.apply(Transition::ScanFailed);
                    entry
                };
                self.emit_all([
                    ForgeEventKind::Log { entry },
                    ForgeEventKind::StateChanged {
                        state: PipelineState::Idle,
                    },
                ])
                .await;
                tracing::warn!("Forge failed: {}", e);
                Err(e)
            }
        }
    }

    /// Walk the roster, then call the generator
    async fn scan(
        &self,
        image: &ImagePayload,
        instruction: &str,
        cancel: &CancellationToken,
    ) -> Result<GeneratedContent> {
        for agent in roster() {
            let entry = {
                let mut session = self.session.write().await;
                session.activate(agent.id);
                session.log(
                    format!("Activation : {} [{}]", agent.label, agent.role),
                    Some(agent.id),
                    LogStatus::Info,
                )
            };
            self.emit_all([
                ForgeEventKind::AgentActivated { agent: agent.id },
                ForgeEventKind::Log { entry },
            ])
            .await;

            self.pause(self.config.activation_delay(), cancel).await?;
            self.log(agent.description, Some(agent.id), LogStatus::Info)
                .await;
            self.pause(self.config.certification_delay(), cancel).await?;

            let entry = {
                let mut session = self.session.write().await;
                session.complete(agent.id);
                session.log(
                    format!("{} : Certification complete.", agent.label),
                    Some(agent.id),
                    LogStatus::Success,
                )
            };
            self.emit_all([
                ForgeEventKind::Log { entry },
                ForgeEventKind::AgentCompleted { agent: agent.id },
            ])
            .await;
            tracing::debug!(agent = agent.id.as_str(), "Agent certified");
        }
        self.session.write().await.clear_active();

        tracing::debug!("Roster certified, requesting analysis");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ForgeError::Cancelled),
            result = self.generator.analyze(image, instruction) => result,
        }
    }

    /// Refine the current result with a free-form instruction.
    ///
    /// On failure the current result is left untouched and the session
    /// returns to `Result`.
    pub async fn refine(
        &self,
        instruction: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<AnalysisResult>> {
        let pending = self.begin_refine(instruction).await?;
        self.execute_refine(pending, cancel).await
    }

    /// Enter `Refining`, checking the preconditions and the busy guard under one write lock
    pub async fn begin_refine(&self, instruction: &str) -> Result<PendingRefine> {
        let (image, current, entry) = {
            let mut session = self.session.write().await;
            let (image, current) = session.begin_refine()?;
            let entry = session.log(
                format!("Refinement: \"{}\"", instruction),
                None,
                LogStatus::Info,
            );
            (image, current, entry)
        };
        self.emit_all([
            ForgeEventKind::StateChanged {
                state: PipelineState::Refining,
            },
            ForgeEventKind::Log { entry },
        ])
        .await;

        Ok(PendingRefine {
            image,
            current,
            instruction: instruction.to_string(),
        })
    }

    /// Call the generator and merge its partial update
    #[tracing::instrument(
        skip(self, pending, cancel),
        fields(model = %self.generator.model_name(), instruction = %pending.instruction)
    )]
    pub async fn execute_refine(
        &self,
        pending: PendingRefine,
        cancel: &CancellationToken,
    ) -> Result<Arc<AnalysisResult>> {
        let PendingRefine {
            image,
            current,
            instruction,
        } = pending;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ForgeError::Cancelled),
            result = self.generator.refine(&image, &current, &instruction) => result,
        };

        let (entry, result) = {
            let mut session = self.session.write().await;
            let (entry, result) = match outcome {
                Ok(patch) => {
                    let merged = Arc::new(current.merged(patch));
                    session.store_result(merged.clone());
                    let entry = session.log(
                        "Refinement complete. Artifacts updated.",
                        Some(AgentId::MasterAssembler),
                        LogStatus::Success,
                    );
                    (entry, Ok(merged))
                }
                Err(e) => {
                    let entry = session.log(
                        format!("Refinement error: {}", e),
                        None,
                        LogStatus::Warning,
                    );
                    (entry, Err(e))
                }
            };
            session.apply(Transition::RefineFinished);
            (entry, result)
        };

        let mut events: Vec<ForgeEventKind> = vec![ForgeEventKind::Log { entry }];
        match &result {
            Ok(merged) => {
                tracing::info!(files = merged.file_count(), "Refinement applied");
                events.push(ForgeEventKind::ResultUpdated {
                    files: merged.file_count(),
                });
            }
            Err(e) => tracing::warn!("Refinement failed: {}", e),
        }
        events.push(ForgeEventKind::StateChanged {
            state: PipelineState::Result,
        });
        self.emit_all(events).await;

        result
    }
}

/// Log lines carried by a batch of events, in order
pub fn log_entries(events: &[ForgeEvent]) -> Vec<&LogEntry> {
    events.iter().filter_map(ForgeEvent::log_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{RefinedContent, Session};
    use crate::swarm::pacer::InstantPacer;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ContentGenerator for Echo {
        async fn analyze(&self, _: &ImagePayload, instruction: &str) -> Result<GeneratedContent> {
            Ok(GeneratedContent {
                spec: instruction.to_string(),
                ..Default::default()
            })
        }

        async fn refine(
            &self,
            _: &ImagePayload,
            _: &AnalysisResult,
            instruction: &str,
        ) -> Result<RefinedContent> {
            Ok(RefinedContent {
                spec: Some(instruction.to_string()),
                ..Default::default()
            })
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn coordinator() -> Coordinator {
        let config = ForgeConfig::default();
        let session = Session::new(&config).shared();
        Coordinator::new(config, session, Arc::new(Echo)).with_pacer(Arc::new(InstantPacer::new()))
    }

    #[tokio::test]
    async fn test_empty_instruction_uses_search_query() {
        let coordinator = coordinator();
        coordinator.set_search_query("Stripe, GDPR").await;

        let result = coordinator
            .run("iVBORw0KGgo", "", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.markdown_spec, "Stripe, GDPR");
    }

    #[tokio::test]
    async fn test_invalid_image_leaves_session_idle() {
        let coordinator = coordinator();
        let err = coordinator
            .run("", "x", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::InvalidImage(_)));

        let snapshot = coordinator.snapshot().await;
        assert_eq!(snapshot.state, PipelineState::Idle);
        assert!(snapshot.logs.is_empty());
    }

    #[tokio::test]
    async fn test_active_marker_cleared_after_run() {
        let coordinator = coordinator();
        coordinator
            .run("iVBORw0KGgo", "x", &CancellationToken::new())
            .await
            .unwrap();

        let snapshot = coordinator.snapshot().await;
        assert_eq!(snapshot.active_agent, None);
        assert_eq!(snapshot.completed_agents.len(), roster().len());
        assert!(snapshot.has_result);
    }
}
