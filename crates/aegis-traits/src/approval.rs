//! The approval workflow for tool actions that `GovernanceGate` marks as
//! `requires_approval`. Resolved in favor of a single CLI-prompt channel for
//! now (see DESIGN.md); the trait is kept separate from the gate so a future
//! channel — a push notification, a web approval queue — can be added
//! without touching policy evaluation.

use async_trait::async_trait;

use crate::error::Result;
use crate::governance::ToolAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Approved,
    Denied,
    TimedOut,
}

#[async_trait]
pub trait ApprovalChannel: Send + Sync {
    /// Block until the operator responds or `timeout_seconds` elapses.
    async fn request_approval(
        &self,
        action: &ToolAction,
        reason: Option<&str>,
        timeout_seconds: u64,
    ) -> Result<ApprovalOutcome>;
}
