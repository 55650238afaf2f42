//! Operational status types supplementing the distilled spec: component
//! health (for `GET /health`) and the Mode Manager's bounded transition
//! history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mode::Mode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub healthy: bool,
    pub detail: Option<String>,
}

impl ComponentHealth {
    pub fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: true,
            detail: None,
        }
    }

    pub fn unhealthy(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: false,
            detail: Some(detail.into()),
        }
    }
}

/// One accepted Mode Manager transition, kept in a bounded history buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeTransitionRecord {
    pub from: Mode,
    pub to: Mode,
    pub reason: String,
    pub evidence: Value,
    pub at: DateTime<Utc>,
}
