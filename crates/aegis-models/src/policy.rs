//! Governance policy data types: per-tool risk, allowed modes, rate limits.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::mode::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub n: u32,
    pub window_seconds: u64,
}

/// Per-tool governance record controlling where and how a tool may run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPolicy {
    pub name: String,
    pub category: String,
    pub risk_level: RiskLevel,
    pub allowed_in_modes: BTreeSet<Mode>,
    pub requires_approval: bool,
    #[serde(default)]
    pub forbidden_paths: Vec<String>,
    #[serde(default)]
    pub allowed_paths: Vec<String>,
    pub timeout_seconds: u64,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

impl ToolPolicy {
    pub fn allows_mode(&self, mode: Mode) -> bool {
        self.allowed_in_modes.contains(&mode)
    }
}

/// Outcome of a governance permission query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub requires_approval: bool,
    pub reason: Option<String>,
    pub rate_limited: bool,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            ..Default::default()
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            requires_approval: false,
            reason: Some(reason.into()),
            rate_limited: false,
        }
    }

    pub fn approval(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            requires_approval: true,
            reason: Some(reason.into()),
            rate_limited: false,
        }
    }

    pub fn rate_limited(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            requires_approval: false,
            reason: Some(reason.into()),
            rate_limited: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_policy_mode_gate() {
        let mut modes = BTreeSet::new();
        modes.insert(Mode::Normal);
        let policy = ToolPolicy {
            name: "read_file".into(),
            category: "fs".into(),
            risk_level: RiskLevel::Low,
            allowed_in_modes: modes,
            requires_approval: false,
            forbidden_paths: vec![],
            allowed_paths: vec![],
            timeout_seconds: 10,
            rate_limit: None,
        };
        assert!(policy.allows_mode(Mode::Normal));
        assert!(!policy.allows_mode(Mode::Lockdown));
    }

    #[test]
    fn decision_constructors() {
        assert!(Decision::allow().allowed);
        assert!(!Decision::deny("nope").allowed);
        assert!(Decision::approval("ask first").requires_approval);
        assert!(Decision::rate_limited("too fast").rate_limited);
    }
}
