//! Layered runtime configuration: built-in defaults overridden by
//! environment variables. Mirrors the teacher's `config/settings.rs`
//! env-then-default layering, minus the TOML config-file tier the teacher
//! adds for its CLI preferences — this service's only on-disk config is
//! the governance policy file, loaded separately by `GovernanceStore::load`.

use std::path::PathBuf;
use std::time::Duration;

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_string(key).as_deref() {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}

/// Settings for C5's MCP gateway, enabled only when `AGENT_MCP_GATEWAY_ENABLED`
/// is set. `command` is parsed as a JSON array if it looks like one,
/// otherwise split on whitespace, matching the teacher's loose CLI-command
/// parsing in `config/cli_config.rs`.
#[derive(Debug, Clone)]
pub struct McpGatewayConfig {
    pub enabled: bool,
    pub command: Vec<String>,
}

fn parse_mcp_command(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(parts) = serde_json::from_str::<Vec<String>>(trimmed) {
            return parts;
        }
    }
    trimmed.split_whitespace().map(str::to_string).collect()
}

impl McpGatewayConfig {
    fn from_env() -> Self {
        let enabled = env_bool("AGENT_MCP_GATEWAY_ENABLED", false);
        let command = env_string("AGENT_MCP_GATEWAY_COMMAND")
            .map(|raw| parse_mcp_command(&raw))
            .unwrap_or_default();
        Self { enabled, command }
    }
}

#[derive(Debug, Clone)]
pub struct RetentionConfig {
    pub hot_days: i64,
    pub disk_usage_alert_percent: f64,
    pub lifecycle_enabled: bool,
}

impl RetentionConfig {
    fn from_env() -> Self {
        Self {
            hot_days: env_parsed("AGENT_RETENTION_HOT_DAYS").unwrap_or(30),
            disk_usage_alert_percent: env_parsed("AGENT_DISK_USAGE_ALERT_PERCENT").unwrap_or(90.0),
            lifecycle_enabled: env_bool("AGENT_DATA_LIFECYCLE_ENABLED", true),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub max_tool_iterations: u32,
    pub max_repeated_tool_calls: u32,
}

impl ExecutorSettings {
    fn from_env() -> Self {
        Self {
            max_tool_iterations: env_parsed("AGENT_MAX_TOOL_ITERATIONS").unwrap_or(25),
            max_repeated_tool_calls: env_parsed("AGENT_MAX_REPEATED_TOOL_CALLS").unwrap_or(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub timeout_seconds: u64,
    pub confidence_threshold: f64,
}

impl RouterSettings {
    fn from_env() -> Self {
        Self {
            timeout_seconds: env_parsed("AGENT_ROUTER_TIMEOUT_SECONDS").unwrap_or(5),
            confidence_threshold: env_parsed("AGENT_ROUTER_CONFIDENCE_THRESHOLD").unwrap_or(0.6),
        }
    }
}

/// Top-level runtime configuration, assembled once at startup from the
/// environment variables named in the external interfaces and data
/// lifecycle sections.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm_base_url: Option<String>,
    pub database_url: Option<String>,
    pub elasticsearch_url: Option<String>,
    pub telemetry_dir: Option<PathBuf>,
    pub policy_path: Option<PathBuf>,
    pub metrics_poll_interval: Duration,
    pub mcp_gateway: McpGatewayConfig,
    pub retention: RetentionConfig,
    pub executor: ExecutorSettings,
    pub router: RouterSettings,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            llm_base_url: env_string("LLM_BASE_URL"),
            database_url: env_string("AGENT_DATABASE_URL"),
            elasticsearch_url: env_string("AGENT_ELASTICSEARCH_URL"),
            telemetry_dir: env_string("AGENT_TELEMETRY_DIR").map(PathBuf::from),
            policy_path: env_string("AGENT_POLICY_PATH").map(PathBuf::from),
            metrics_poll_interval: Duration::from_secs(
                env_parsed("METRICS_DAEMON_POLL_INTERVAL_SECONDS").unwrap_or(5),
            ),
            mcp_gateway: McpGatewayConfig::from_env(),
            retention: RetentionConfig::from_env(),
            executor: ExecutorSettings::from_env(),
            router: RouterSettings::from_env(),
        }
    }

    /// `$AGENT_POLICY_PATH`, or `~/.config/aegis/policy.toml` when unset.
    pub fn resolved_policy_path(&self) -> PathBuf {
        self.policy_path.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("aegis")
                .join("policy.toml")
        })
    }

    /// `$AGENT_TELEMETRY_DIR`, or `~/.local/share/aegis/telemetry` when unset.
    pub fn resolved_telemetry_dir(&self) -> PathBuf {
        self.telemetry_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("aegis")
                .join("telemetry")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mcp_command_parses_json_array() {
        assert_eq!(
            parse_mcp_command(r#"["npx", "-y", "some-mcp-server"]"#),
            vec!["npx".to_string(), "-y".to_string(), "some-mcp-server".to_string()]
        );
    }

    #[test]
    fn mcp_command_falls_back_to_whitespace_split() {
        assert_eq!(
            parse_mcp_command("npx -y some-mcp-server"),
            vec!["npx".to_string(), "-y".to_string(), "some-mcp-server".to_string()]
        );
    }
}
