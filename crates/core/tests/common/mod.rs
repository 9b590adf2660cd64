//! Shared fixtures for forge integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

use vanguard_core::config::ForgeConfig;
use vanguard_core::error::{ForgeError, Result};
use vanguard_core::generator::{ContentGenerator, ImagePayload};
use vanguard_core::state::{
    AnalysisResult, DesignTokens, GeneratedContent, ProjectFile, RefinedContent, Session,
};
use vanguard_core::swarm::{Coordinator, ForgeEvent, InstantPacer};

pub const IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg";

/// Which generator call was made, with the instruction it received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Analyze(String),
    Refine(String),
}

/// Generator returning canned content and recording its calls
pub struct StubGenerator {
    pub analysis: GeneratedContent,
    pub refinement: Option<RefinedContent>,
    pub calls: Mutex<Vec<Call>>,
    /// When set, analyze waits for a notification before answering
    pub gate: Option<Arc<Notify>>,
    /// When set, refine waits for a notification before answering
    pub refine_gate: Option<Arc<Notify>>,
}

impl StubGenerator {
    pub fn new(analysis: GeneratedContent) -> Self {
        Self {
            analysis,
            refinement: None,
            calls: Mutex::new(Vec::new()),
            gate: None,
            refine_gate: None,
        }
    }

    pub fn with_refinement(mut self, refinement: RefinedContent) -> Self {
        self.refinement = Some(refinement);
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn gated_refine(mut self, gate: Arc<Notify>) -> Self {
        self.refine_gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn analyze(&self, _image: &ImagePayload, instruction: &str) -> Result<GeneratedContent> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Analyze(instruction.to_string()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.analysis.clone())
    }

    async fn refine(
        &self,
        _image: &ImagePayload,
        _current: &AnalysisResult,
        instruction: &str,
    ) -> Result<RefinedContent> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Refine(instruction.to_string()));
        if let Some(gate) = &self.refine_gate {
            gate.notified().await;
        }
        self.refinement
            .clone()
            .ok_or_else(|| ForgeError::Generation("refinement quota exceeded".to_string()))
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

/// Generator that always fails
pub struct FailingGenerator;

#[async_trait]
impl ContentGenerator for FailingGenerator {
    async fn analyze(&self, _: &ImagePayload, _: &str) -> Result<GeneratedContent> {
        Err(ForgeError::Generation("model overloaded".to_string()))
    }

    async fn refine(&self, _: &ImagePayload, _: &AnalysisResult, _: &str) -> Result<RefinedContent> {
        Err(ForgeError::Generation("model overloaded".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

pub fn single_file_content() -> GeneratedContent {
    let mut tokens = DesignTokens::default();
    tokens.colors.primary = "#E6644C".to_string();
    tokens.radii.card = "16px".to_string();
    GeneratedContent {
        tokens,
        spec: "# Manifesto".to_string(),
        rules: "Use foundryTheme".to_string(),
        project_files: vec![ProjectFile::new("a.ts", "export const a = 1;")],
    }
}

pub struct Harness {
    pub coordinator: Arc<Coordinator>,
    pub pacer: Arc<InstantPacer>,
    pub events: mpsc::Receiver<ForgeEvent>,
}

impl Harness {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        let config = ForgeConfig::default();
        let session = Session::new(&config).shared();
        let pacer = Arc::new(InstantPacer::new());
        let (tx, rx) = mpsc::channel(256);
        let coordinator = Coordinator::new(config, session, generator)
            .with_pacer(pacer.clone())
            .with_event_channel(tx);
        Self {
            coordinator: Arc::new(coordinator),
            pacer,
            events: rx,
        }
    }

    /// Drain every event emitted so far
    pub fn drain(&mut self) -> Vec<ForgeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
