//! # Session State
//!
//! Everything the presentation layer observes for one user session: pipeline
//! state, console log, agent progress, credits and the current result.
//!
//! The session is a plain value. The [`Coordinator`](crate::swarm::Coordinator)
//! holds it behind a [`SharedSession`] and takes the write lock for one
//! transition at a time, so observers can snapshot it while a run is suspended.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::ForgeConfig;
use crate::error::{ForgeError, Result};
use crate::generator::ImagePayload;
use crate::swarm::events::{LogEntry, LogStatus};
use crate::swarm::pipeline::{PipelineState, Transition};
use crate::swarm::roster::AgentId;

use super::logs::LogBuffer;
use super::result::AnalysisResult;

pub type SharedSession = Arc<RwLock<Session>>;

#[derive(Debug, Clone)]
pub struct Session {
    state: PipelineState,
    logs: LogBuffer,
    active_agent: Option<AgentId>,
    completed_agents: Vec<AgentId>,
    credits: i64,
    current: Option<Arc<AnalysisResult>>,
    source_image: Option<ImagePayload>,
    search_query: String,
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: PipelineState,
    /// A run or refinement is in flight
    pub busy: bool,
    pub active_agent: Option<AgentId>,
    pub completed_agents: Vec<AgentId>,
    pub credits: i64,
    pub logs: Vec<LogEntry>,
    pub has_result: bool,
    pub search_query: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&ForgeConfig::default())
    }
}

impl Session {
    pub fn new(config: &ForgeConfig) -> Self {
        Self {
            state: PipelineState::Idle,
            logs: LogBuffer::with_capacity(config.log_capacity),
            active_agent: None,
            completed_agents: Vec::new(),
            credits: config.starting_credits,
            current: None,
            source_image: None,
            search_query: String::new(),
        }
    }

    /// Wrap into a shareable handle
    pub fn shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    pub fn active_agent(&self) -> Option<AgentId> {
        self.active_agent
    }

    pub fn completed_agents(&self) -> &[AgentId] {
        &self.completed_agents
    }

    pub fn credits(&self) -> i64 {
        self.credits
    }

    /// The current result, if any
    pub fn current(&self) -> Option<Arc<AnalysisResult>> {
        self.current.clone()
    }

    pub fn source_image(&self) -> Option<&ImagePayload> {
        self.source_image.as_ref()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    /// Apply a state transition; returns the new state or `None` when not allowed
    pub fn apply(&mut self, transition: Transition) -> Option<PipelineState> {
        let next = self.state.transition(transition)?;
        self.state = next;
        Some(next)
    }

    /// Enter `Scanning` for a new run
    ///
    /// Stores the image and resets the console and agent progress. The current
    /// result is kept until a new one replaces it.
    pub fn begin_scan(&mut self, image: ImagePayload) -> Result<()> {
        if self.apply(Transition::BeginScan).is_none() {
            return Err(ForgeError::Busy(self.state));
        }
        self.source_image = Some(image);
        self.logs.clear();
        self.completed_agents.clear();
        self.active_agent = None;
        Ok(())
    }

    /// Enter `Refining`, returning the inputs the refinement needs
    pub fn begin_refine(&mut self) -> Result<(ImagePayload, Arc<AnalysisResult>)> {
        let current = self
            .current
            .clone()
            .ok_or(ForgeError::Precondition("no current result to refine"))?;
        let image = self
            .source_image
            .clone()
            .ok_or(ForgeError::Precondition("no source image"))?;
        if self.apply(Transition::BeginRefine).is_none() {
            return Err(ForgeError::Busy(self.state));
        }
        Ok((image, current))
    }

    pub fn log(
        &mut self,
        message: impl Into<String>,
        agent: Option<AgentId>,
        status: LogStatus,
    ) -> LogEntry {
        let entry = LogEntry::new(message, agent, status);
        self.logs.push(entry.clone());
        entry
    }

    pub fn activate(&mut self, agent: AgentId) {
        self.active_agent = Some(agent);
    }

    pub fn complete(&mut self, agent: AgentId) {
        if !self.completed_agents.contains(&agent) {
            self.completed_agents.push(agent);
        }
    }

    pub fn clear_active(&mut self) {
        self.active_agent = None;
    }

    /// Replace the current result
    pub fn store_result(&mut self, result: Arc<AnalysisResult>) {
        self.current = Some(result);
    }

    pub fn spend_credits(&mut self, amount: i64) -> i64 {
        self.credits -= amount;
        self.credits
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            busy: self.state.is_busy(),
            active_agent: self.active_agent,
            completed_agents: self.completed_agents.clone(),
            credits: self.credits,
            logs: self.logs.to_vec(),
            has_result: self.current.is_some(),
            search_query: self.search_query.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::result::GeneratedContent;

    fn image() -> ImagePayload {
        ImagePayload::parse("data:image/png;base64,AAAA").unwrap()
    }

    #[test]
    fn test_begin_scan_resets_progress() {
        let mut session = Session::default();
        session.log("old", None, LogStatus::Info);
        session.complete(AgentId::VisualParser);

        session.begin_scan(image()).unwrap();

        assert_eq!(session.state(), PipelineState::Scanning);
        assert!(session.logs().is_empty());
        assert!(session.completed_agents().is_empty());
        assert!(session.source_image().is_some());
    }

    #[test]
    fn test_second_scan_is_rejected() {
        let mut session = Session::default();
        session.begin_scan(image()).unwrap();
        let err = session.begin_scan(image()).unwrap_err();
        assert!(matches!(err, ForgeError::Busy(PipelineState::Scanning)));
    }

    #[test]
    fn test_refine_requires_result() {
        let mut session = Session::default();
        session.begin_scan(image()).unwrap();
        session.apply(Transition::ScanFailed);

        let err = session.begin_refine().unwrap_err();
        assert!(matches!(err, ForgeError::Precondition(_)));
        assert_eq!(session.state(), PipelineState::Idle);
    }

    #[test]
    fn test_begin_refine_hands_out_current() {
        let mut session = Session::default();
        session.begin_scan(image()).unwrap();
        let result = Arc::new(AnalysisResult::from_generated(GeneratedContent::default()));
        session.store_result(result.clone());
        session.apply(Transition::ScanSucceeded);

        let (_, current) = session.begin_refine().unwrap();
        assert!(Arc::ptr_eq(&current, &result));
        assert_eq!(session.state(), PipelineState::Refining);
    }

    #[test]
    fn test_credits_and_snapshot() {
        let mut session = Session::default();
        assert_eq!(session.spend_credits(50), 2362);
        session.set_search_query("Stripe, SEO");

        let snapshot = session.snapshot();
        assert_eq!(snapshot.credits, 2362);
        assert_eq!(snapshot.search_query, "Stripe, SEO");
        assert!(!snapshot.has_result);
        assert!(!snapshot.busy);

        session.begin_scan(image()).unwrap();
        assert!(session.snapshot().busy);
    }
}
