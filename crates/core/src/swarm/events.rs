//! # Forge Events
//!
//! Log entries and the event stream observed by the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pipeline::PipelineState;
use super::roster::AgentId;

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    #[default]
    Info,
    Success,
    Warning,
}

/// One line of the forge console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    /// Agent that produced the line; `None` for the system itself
    #[serde(default)]
    pub agent: Option<AgentId>,
    pub status: LogStatus,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, agent: Option<AgentId>, status: LogStatus) -> Self {
        Self {
            message: message.into(),
            agent,
            status,
        }
    }

    pub fn system(message: impl Into<String>, status: LogStatus) -> Self {
        Self::new(message, None, status)
    }

    /// Source label as displayed in the console
    pub fn source(&self) -> &'static str {
        self.agent.map(|a| a.descriptor().label).unwrap_or("system")
    }
}

/// Kind of forge event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForgeEventKind {
    /// Pipeline state changed
    StateChanged { state: PipelineState },
    /// Agent became the active one
    AgentActivated { agent: AgentId },
    /// Agent finished its certification
    AgentCompleted { agent: AgentId },
    /// A line was appended to the console
    Log { entry: LogEntry },
    /// A new current result was stored
    ResultUpdated { files: usize },
    /// Credits counter changed
    CreditsChanged { credits: i64 },
}

/// An event in the forge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeEvent {
    /// Unique event ID
    pub id: String,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ForgeEventKind,
}

impl ForgeEvent {
    pub fn new(kind: ForgeEventKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// The log entry carried by this event, if any
    pub fn log_entry(&self) -> Option<&LogEntry> {
        match &self.kind {
            ForgeEventKind::Log { entry } => Some(entry),
            _ => None,
        }
    }
}
