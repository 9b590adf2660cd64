//! Pacing between agent steps.
//!
//! The delays are purely visual. They go through a [`Pacer`] so tests and
//! headless runs can skip the wall clock.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Suspend the current flow for `duration`, yielding to other tasks
    async fn pause(&self, duration: Duration);
}

/// Real timer backed by `tokio::time::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested pauses and only yields
#[derive(Debug, Default)]
pub struct InstantPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl InstantPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pause requested so far, in order
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Pacer for InstantPacer {
    async fn pause(&self, duration: Duration) {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.push(duration);
        }
        tokio::task::yield_now().await;
    }
}
