//! TOML policy file schema: `[modes.<name>]`, `[tools.<name>]`, `[safety]`.
//! Loaded once at startup (§3 "Policies: process-wide, loaded at startup").

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;

use aegis_models::{Mode, ModeDefinition, ModeThresholds, RateLimitConfig, RiskLevel, ToolPolicy};

use crate::error::{AegisError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyFile {
    #[serde(default)]
    pub modes: HashMap<String, ModeFileEntry>,
    #[serde(default)]
    pub tools: HashMap<String, ToolFileEntry>,
    #[serde(default)]
    pub safety: SafetySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModeFileEntry {
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
    #[serde(default)]
    pub disk_percent: Option<f64>,
    #[serde(default)]
    pub gpu_percent: Option<f64>,
    #[serde(default = "default_sustained_seconds")]
    pub sustained_seconds: u64,
    #[serde(default)]
    pub allowed_transitions: Vec<String>,
}

fn default_sustained_seconds() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolFileEntry {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_risk")]
    pub risk_level: String,
    #[serde(default)]
    pub allowed_in_modes: Vec<String>,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub forbidden_paths: Vec<String>,
    #[serde(default)]
    pub allowed_paths: Vec<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub rate_limit: Option<RateLimitFileEntry>,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_risk() -> String {
    "medium".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitFileEntry {
    pub n: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SafetySection {
    #[serde(default)]
    pub disk_usage_alert_percent: Option<f64>,
}

fn parse_mode(name: &str) -> Result<Mode> {
    match name.to_uppercase().as_str() {
        "NORMAL" => Ok(Mode::Normal),
        "ALERT" => Ok(Mode::Alert),
        "DEGRADED" => Ok(Mode::Degraded),
        "LOCKDOWN" => Ok(Mode::Lockdown),
        "RECOVERY" => Ok(Mode::Recovery),
        other => Err(AegisError::Internal(format!("unknown mode '{other}' in policy file"))),
    }
}

fn parse_risk(name: &str) -> RiskLevel {
    match name.to_lowercase().as_str() {
        "low" => RiskLevel::Low,
        "high" => RiskLevel::High,
        _ => RiskLevel::Medium,
    }
}

/// Expand `$HOME`-style environment variable references in a path-glob
/// entry, once, at load time.
fn expand_env(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            let mut name = String::new();
            while matches!(chars.peek(), Some(c) if c.is_ascii_alphanumeric() || *c == '_') {
                name.push(chars.next().unwrap());
            }
            if name.is_empty() {
                out.push('$');
            } else {
                out.push_str(&std::env::var(&name).unwrap_or_default());
            }
        } else {
            out.push(c);
        }
    }
    out
}

impl PolicyFile {
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AegisError::Internal(format!("reading policy file {path:?}: {e}")))?;
        let file: PolicyFile = toml::from_str(&contents)
            .map_err(|e| AegisError::Internal(format!("parsing policy file {path:?}: {e}")))?;
        Ok(file)
    }

    pub fn mode_definitions(&self) -> Result<HashMap<Mode, ModeDefinition>> {
        let mut table = HashMap::new();
        for (name, entry) in &self.modes {
            let mode = parse_mode(name)?;
            let mut allowed = BTreeSet::new();
            for transition in &entry.allowed_transitions {
                allowed.insert(parse_mode(transition)?);
            }
            table.insert(
                mode,
                ModeDefinition {
                    mode,
                    thresholds: ModeThresholds {
                        cpu_percent: entry.cpu_percent,
                        memory_percent: entry.memory_percent,
                        disk_percent: entry.disk_percent,
                        gpu_percent: entry.gpu_percent,
                    },
                    sustained_seconds: entry.sustained_seconds,
                    allowed_transitions: allowed,
                },
            );
        }
        Ok(table)
    }

    pub fn tool_policies(&self) -> Result<HashMap<String, ToolPolicy>> {
        let mut table = HashMap::new();
        for (name, entry) in &self.tools {
            let mut allowed_in_modes = BTreeSet::new();
            for mode_name in &entry.allowed_in_modes {
                allowed_in_modes.insert(parse_mode(mode_name)?);
            }
            table.insert(
                name.clone(),
                ToolPolicy {
                    name: name.clone(),
                    category: entry.category.clone(),
                    risk_level: parse_risk(&entry.risk_level),
                    allowed_in_modes,
                    requires_approval: entry.requires_approval,
                    forbidden_paths: entry.forbidden_paths.iter().map(|p| expand_env(p)).collect(),
                    allowed_paths: entry.allowed_paths.iter().map(|p| expand_env(p)).collect(),
                    timeout_seconds: entry.timeout_seconds,
                    rate_limit: entry.rate_limit.as_ref().map(|r| RateLimitConfig {
                        n: r.n,
                        window_seconds: r.window_seconds,
                    }),
                },
            );
        }
        Ok(table)
    }

    /// A minimal, fully-permissive default so the service can start without
    /// requiring an operator to hand-author a policy file first.
    pub fn default_document() -> &'static str {
        r#"
[modes.NORMAL]
cpu_percent = 85.0
memory_percent = 85.0
disk_percent = 90.0
sustained_seconds = 60
allowed_transitions = ["ALERT"]

[modes.ALERT]
cpu_percent = 95.0
memory_percent = 95.0
disk_percent = 95.0
sustained_seconds = 60
allowed_transitions = ["NORMAL", "DEGRADED", "RECOVERY"]

[modes.DEGRADED]
sustained_seconds = 60
allowed_transitions = ["ALERT", "LOCKDOWN", "RECOVERY"]

[modes.LOCKDOWN]
sustained_seconds = 60
allowed_transitions = ["DEGRADED"]

[modes.RECOVERY]
sustained_seconds = 30
allowed_transitions = ["NORMAL", "ALERT", "DEGRADED", "LOCKDOWN"]

[tools.read_file]
category = "filesystem"
risk_level = "low"
allowed_in_modes = ["NORMAL", "ALERT", "DEGRADED", "RECOVERY"]
requires_approval = false
forbidden_paths = ["/etc/shadow", "/etc/passwd", "$HOME/.ssh/**"]
timeout_seconds = 10

[tools.list_directory]
category = "filesystem"
risk_level = "low"
allowed_in_modes = ["NORMAL", "ALERT", "DEGRADED", "RECOVERY"]
requires_approval = false
forbidden_paths = ["/etc/shadow", "$HOME/.ssh/**"]
timeout_seconds = 10

[tools.system_metrics_snapshot]
category = "observability"
risk_level = "low"
allowed_in_modes = ["NORMAL", "ALERT", "DEGRADED", "LOCKDOWN", "RECOVERY"]
requires_approval = false
timeout_seconds = 5

[tools.search_web]
category = "network"
risk_level = "medium"
allowed_in_modes = ["NORMAL", "ALERT"]
requires_approval = false
timeout_seconds = 10

[safety]
disk_usage_alert_percent = 90.0
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_parses() {
        let file: PolicyFile = toml::from_str(PolicyFile::default_document()).unwrap();
        let modes = file.mode_definitions().unwrap();
        assert!(modes.contains_key(&Mode::Normal));
        assert!(modes[&Mode::Normal].allowed_transitions.contains(&Mode::Alert));
        let tools = file.tool_policies().unwrap();
        assert!(tools.contains_key("read_file"));
        assert!(tools["read_file"].forbidden_paths.iter().any(|p| p.contains(".ssh")));
    }

    #[test]
    fn env_expansion_substitutes_home() {
        std::env::set_var("AEGIS_TEST_HOME_PROBE", "/tmp/probe");
        let expanded = expand_env("$AEGIS_TEST_HOME_PROBE/.ssh/**");
        assert_eq!(expanded, "/tmp/probe/.ssh/**");
    }
}
