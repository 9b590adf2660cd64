//! # Swarm Orchestration
//!
//! The agent roster and the coordinator that drives it.
//!
//! ## Pipeline Flow
//!
//! ```text
//! Idle ──run──▶ Scanning ──ok──▶ Result ──refine──▶ Refining ──▶ Result
//!                   └──err──▶ Idle
//! ```

pub mod coordinator;
pub mod events;
pub mod pacer;
pub mod pipeline;
pub mod roster;

pub use coordinator::{log_entries, Coordinator, PendingRefine, PendingRun};
pub use events::{ForgeEvent, ForgeEventKind, LogEntry, LogStatus};
pub use pacer::{InstantPacer, Pacer, TokioPacer};
pub use pipeline::{PipelineState, Transition};
pub use roster::{roster, AgentDescriptor, AgentId, ROSTER};
