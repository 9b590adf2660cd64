//! # Pipeline States
//!
//! The forge state machine. Every `(state, transition)` pair maps to exactly
//! one outcome: a next state, or a rejection.

use serde::{Deserialize, Serialize};

/// State of the forge pipeline, drives which view the presentation layer renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Waiting for a screenshot
    #[default]
    Idle,
    /// Agents are running and the generator call is pending
    Scanning,
    /// A refinement request is in flight
    Refining,
    /// A result is available
    Result,
}

/// Entry actions that move the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    BeginScan,
    ScanSucceeded,
    ScanFailed,
    BeginRefine,
    RefineFinished,
}

impl PipelineState {
    /// Apply a transition, returning the next state or `None` if it is not allowed here
    pub fn transition(self, transition: Transition) -> Option<PipelineState> {
        use PipelineState::*;
        use Transition::*;
        match (self, transition) {
            (Idle | Result, BeginScan) => Some(Scanning),
            (Scanning, ScanSucceeded) => Some(Result),
            (Scanning, ScanFailed) => Some(Idle),
            (Idle | Result, BeginRefine) => Some(Refining),
            (Refining, RefineFinished) => Some(Result),
            _ => None,
        }
    }

    /// A flow is in flight; new runs and refinements are rejected
    pub fn is_busy(self) -> bool {
        matches!(self, PipelineState::Scanning | PipelineState::Refining)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Scanning => "scanning",
            PipelineState::Refining => "refining",
            PipelineState::Result => "result",
        }
    }
}
