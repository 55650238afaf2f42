//! The Governance Store (C2): loaded mode/tool policy, permission queries,
//! path validation, and per-tool sliding-window rate limiting. Grounded in
//! the teacher's policy evaluation order (`security/checker.rs`: blocklist
//! before allowlist) generalised against the spec's `ToolPolicy` shape.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use aegis_models::{Decision, Mode, ModeDefinition, ModeThresholds, ToolPolicy};
use aegis_traits::{GovernanceGate, Result as TraitResult, ToolAction};

use crate::error::{AegisError, Result};
use crate::governance::policy_file::PolicyFile;

/// Coarse per-mode limits on which model roles may be used, derived from
/// mode alone (the LLM adapter still picks the concrete backend model).
#[derive(Debug, Clone)]
pub struct ModelConstraints {
    pub allow_reasoning: bool,
    pub allow_coding: bool,
    pub max_tokens: Option<u32>,
}

impl ModelConstraints {
    fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Normal | Mode::Alert => ModelConstraints {
                allow_reasoning: true,
                allow_coding: true,
                max_tokens: None,
            },
            Mode::Degraded => ModelConstraints {
                allow_reasoning: false,
                allow_coding: true,
                max_tokens: Some(2048),
            },
            Mode::Lockdown => ModelConstraints {
                allow_reasoning: false,
                allow_coding: false,
                max_tokens: Some(512),
            },
            Mode::Recovery => ModelConstraints {
                allow_reasoning: true,
                allow_coding: true,
                max_tokens: None,
            },
        }
    }
}

struct RateLimiter {
    windows: tokio::sync::Mutex<HashMap<(String, String), VecDeque<Instant>>>,
}

impl RateLimiter {
    fn new() -> Self {
        Self {
            windows: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Records one call and returns whether the `(tool, caller)` pair is
    /// currently over its configured rate limit.
    async fn check_and_record(&self, tool: &str, caller: &str, n: u32, window: Duration) -> bool {
        let key = (tool.to_string(), caller.to_string());
        let mut windows = self.windows.lock().await;
        let entry = windows.entry(key).or_default();
        let now = Instant::now();
        while let Some(front) = entry.front() {
            if now.duration_since(*front) > window {
                entry.pop_front();
            } else {
                break;
            }
        }
        let over_limit = entry.len() as u32 >= n;
        if !over_limit {
            entry.push_back(now);
        }
        over_limit
    }
}

pub struct GovernanceStore {
    mode_definitions: HashMap<Mode, ModeDefinition>,
    tool_policies: RwLock<HashMap<String, ToolPolicy>>,
    rate_limiter: RateLimiter,
}

impl GovernanceStore {
    pub fn new(
        mode_definitions: HashMap<Mode, ModeDefinition>,
        tool_policies: HashMap<String, ToolPolicy>,
    ) -> Self {
        Self {
            mode_definitions,
            tool_policies: RwLock::new(tool_policies),
            rate_limiter: RateLimiter::new(),
        }
    }

    /// Load from a TOML policy file on disk. Startup fails (per §4.2,
    /// "unreadable policy file fails startup") if the file exists but can't
    /// be parsed; a missing file falls back to `PolicyFile::default_document`.
    pub async fn load(path: &std::path::Path) -> Result<Self> {
        let file = if tokio::fs::try_exists(path).await.unwrap_or(false) {
            PolicyFile::load(path).await?
        } else {
            toml::from_str(PolicyFile::default_document())
                .map_err(|e| AegisError::Internal(format!("default policy document: {e}")))?
        };
        Ok(Self::new(file.mode_definitions()?, file.tool_policies()?))
    }

    pub fn mode_thresholds(&self, mode: Mode) -> ModeThresholds {
        self.mode_definitions
            .get(&mode)
            .map(|def| def.thresholds.clone())
            .unwrap_or_default()
    }

    pub fn mode_definition(&self, mode: Mode) -> Option<&ModeDefinition> {
        self.mode_definitions.get(&mode)
    }

    pub fn mode_definitions(&self) -> &HashMap<Mode, ModeDefinition> {
        &self.mode_definitions
    }

    pub fn model_constraints(&self, mode: Mode) -> ModelConstraints {
        ModelConstraints::for_mode(mode)
    }

    pub async fn tool_policy(&self, tool_name: &str) -> Option<ToolPolicy> {
        self.tool_policies.read().await.get(tool_name).cloned()
    }

    /// Glob-match `path` against a tool's forbidden/allowed path lists.
    /// Deny precedes allow: a forbidden-path match is never overridden by
    /// an allowed-path match.
    pub fn validate_path(path: &str, policy: &ToolPolicy) -> std::result::Result<(), String> {
        for pattern in &policy.forbidden_paths {
            if glob_match::glob_match(pattern, path) {
                return Err(format!("path '{path}' matches forbidden pattern '{pattern}'"));
            }
        }
        if !policy.allowed_paths.is_empty() {
            let allowed = policy
                .allowed_paths
                .iter()
                .any(|pattern| glob_match::glob_match(pattern, path));
            if !allowed {
                return Err(format!("path '{path}' is not within an allowed pattern"));
            }
        }
        Ok(())
    }

    /// Full permission query for an actual tool invocation: mode gate, path
    /// policy (if the action carries a target), then rate limit.
    pub async fn check_tool_allowed(&self, action: &ToolAction, mode: Mode) -> Decision {
        let Some(policy) = self.tool_policy(&action.tool_name).await else {
            return Decision::deny(format!("no policy configured for tool '{}'", action.tool_name));
        };

        if !policy.allows_mode(mode) {
            return Decision::deny(format!(
                "tool '{}' is not allowed in mode {:?}",
                action.tool_name, mode
            ));
        }

        if !action.target.is_empty() {
            if let Err(reason) = Self::validate_path(&action.target, &policy) {
                return Decision::deny(reason);
            }
        }

        if let Some(limit) = &policy.rate_limit {
            let over_limit = self
                .rate_limiter
                .check_and_record(
                    &action.tool_name,
                    "default",
                    limit.n,
                    Duration::from_secs(limit.window_seconds),
                )
                .await;
            if over_limit {
                return Decision::rate_limited(format!(
                    "tool '{}' exceeded {} calls per {}s",
                    action.tool_name, limit.n, limit.window_seconds
                ));
            }
        }

        if policy.requires_approval {
            return Decision::approval(format!("tool '{}' requires operator approval", action.tool_name));
        }

        Decision::allow()
    }

    /// Register a discovered (e.g. MCP) tool's policy if one doesn't
    /// already exist, so auto-discovery never clobbers operator
    /// customisation. See [`crate::governance::discovery`].
    pub async fn ensure_tool_configured(&self, policy: ToolPolicy) {
        let mut policies = self.tool_policies.write().await;
        policies.entry(policy.name.clone()).or_insert(policy);
    }
}

#[async_trait]
impl GovernanceGate for GovernanceStore {
    async fn check_action(&self, action: &ToolAction, mode: Mode) -> TraitResult<Decision> {
        Ok(self.check_tool_allowed(action, mode).await)
    }

    async fn tool_allowed_in_mode(&self, tool_name: &str, mode: Mode) -> TraitResult<bool> {
        Ok(self
            .tool_policy(tool_name)
            .await
            .map(|p| p.allows_mode(mode))
            .unwrap_or(false))
    }
}

pub type SharedGovernanceStore = Arc<GovernanceStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn read_file_policy(forbidden: Vec<&str>, allowed: Vec<&str>) -> ToolPolicy {
        let mut modes = BTreeSet::new();
        modes.insert(Mode::Normal);
        ToolPolicy {
            name: "read_file".into(),
            category: "filesystem".into(),
            risk_level: aegis_models::RiskLevel::Low,
            allowed_in_modes: modes,
            requires_approval: false,
            forbidden_paths: forbidden.into_iter().map(String::from).collect(),
            allowed_paths: allowed.into_iter().map(String::from).collect(),
            timeout_seconds: 10,
            rate_limit: None,
        }
    }

    #[test]
    fn deny_wins_over_allow() {
        let policy = read_file_policy(vec!["/etc/shadow"], vec!["/etc/*"]);
        assert!(GovernanceStore::validate_path("/etc/shadow", &policy).is_err());
    }

    #[test]
    fn allowed_paths_restrict_when_non_empty() {
        let policy = read_file_policy(vec![], vec!["/workspace/**"]);
        assert!(GovernanceStore::validate_path("/workspace/a.txt", &policy).is_ok());
        assert!(GovernanceStore::validate_path("/etc/passwd", &policy).is_err());
    }

    #[test]
    fn empty_allowed_paths_means_unrestricted() {
        let policy = read_file_policy(vec!["/etc/shadow"], vec![]);
        assert!(GovernanceStore::validate_path("/home/user/file.txt", &policy).is_ok());
    }

    #[tokio::test]
    async fn unknown_tool_is_denied() {
        let store = GovernanceStore::new(HashMap::new(), HashMap::new());
        let decision = store
            .check_tool_allowed(&ToolAction::new("mystery", "execute", ""), Mode::Normal)
            .await;
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn mode_gate_denies_outside_allowed_modes() {
        let mut policies = HashMap::new();
        policies.insert("read_file".to_string(), read_file_policy(vec![], vec![]));
        let store = GovernanceStore::new(HashMap::new(), policies);
        let decision = store
            .check_tool_allowed(&ToolAction::new("read_file", "execute", "/tmp/a"), Mode::Lockdown)
            .await;
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn forbidden_path_denies_even_when_mode_allows() {
        let mut policies = HashMap::new();
        policies.insert(
            "read_file".to_string(),
            read_file_policy(vec!["/etc/shadow"], vec![]),
        );
        let store = GovernanceStore::new(HashMap::new(), policies);
        let decision = store
            .check_tool_allowed(
                &ToolAction::new("read_file", "execute", "/etc/shadow"),
                Mode::Normal,
            )
            .await;
        assert!(!decision.allowed);
        assert!(!decision.rate_limited);
    }

    #[tokio::test]
    async fn rate_limit_trips_after_n_calls() {
        let mut policy = read_file_policy(vec![], vec![]);
        policy.rate_limit = Some(aegis_models::RateLimitConfig {
            n: 2,
            window_seconds: 60,
        });
        let mut policies = HashMap::new();
        policies.insert("read_file".to_string(), policy);
        let store = GovernanceStore::new(HashMap::new(), policies);
        let action = ToolAction::new("read_file", "execute", "/tmp/a");
        assert!(store.check_tool_allowed(&action, Mode::Normal).await.allowed);
        assert!(store.check_tool_allowed(&action, Mode::Normal).await.allowed);
        let third = store.check_tool_allowed(&action, Mode::Normal).await;
        assert!(third.rate_limited);
    }

    #[tokio::test]
    async fn ensure_tool_configured_preserves_existing_policy() {
        let mut policies = HashMap::new();
        let mut custom = read_file_policy(vec![], vec![]);
        custom.requires_approval = true;
        policies.insert("mcp_search".to_string(), custom);
        let store = GovernanceStore::new(HashMap::new(), policies);

        let generated = read_file_policy(vec![], vec![]);
        store
            .ensure_tool_configured(ToolPolicy {
                name: "mcp_search".into(),
                requires_approval: false,
                ..generated
            })
            .await;

        let preserved = store.tool_policy("mcp_search").await.unwrap();
        assert!(preserved.requires_approval);
    }
}
