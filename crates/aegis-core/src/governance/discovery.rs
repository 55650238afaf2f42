//! Auto-discovery of tool policy for tools the registry learns about at
//! runtime (MCP-exposed tools) rather than from the static policy file.
//! Risk is inferred from the tool name/description so a newly surfaced
//! tool never runs ungoverned, per §4.2 "every tool, including those
//! discovered at runtime, has a `ToolPolicy` before it can be invoked."

use std::collections::BTreeSet;

use aegis_models::{Mode, RiskLevel, ToolPolicy};

const HIGH_RISK_KEYWORDS: &[&str] = &[
    "write", "delete", "execute", "send", "create", "modify", "update", "remove",
];

const LOW_RISK_KEYWORDS: &[&str] = &["read", "get", "list", "search", "query", "view", "show", "fetch"];

fn infer_risk(name: &str, description: &str) -> RiskLevel {
    let haystack = format!("{name} {description}").to_lowercase();
    if HIGH_RISK_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        RiskLevel::High
    } else if LOW_RISK_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    }
}

/// Build a conservative default policy for a tool with no explicit
/// operator configuration. High-risk tools require approval and are
/// withheld outside Normal/Alert; low-risk tools run everywhere except
/// Lockdown.
pub fn discover_policy(name: &str, category: &str, description: &str) -> ToolPolicy {
    let risk_level = infer_risk(name, description);

    let mut allowed_in_modes = BTreeSet::new();
    match risk_level {
        RiskLevel::Low => {
            allowed_in_modes.insert(Mode::Normal);
            allowed_in_modes.insert(Mode::Alert);
            allowed_in_modes.insert(Mode::Degraded);
            allowed_in_modes.insert(Mode::Recovery);
        }
        RiskLevel::Medium => {
            allowed_in_modes.insert(Mode::Normal);
            allowed_in_modes.insert(Mode::Alert);
            allowed_in_modes.insert(Mode::Recovery);
        }
        RiskLevel::High => {
            allowed_in_modes.insert(Mode::Normal);
        }
    }

    ToolPolicy {
        name: name.to_string(),
        category: category.to_string(),
        risk_level,
        allowed_in_modes,
        requires_approval: matches!(risk_level, RiskLevel::High),
        forbidden_paths: Vec::new(),
        allowed_paths: Vec::new(),
        timeout_seconds: 30,
        rate_limit: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_keyword_infers_high_risk() {
        let policy = discover_policy("write_file", "filesystem", "Writes content to a file");
        assert_eq!(policy.risk_level, RiskLevel::High);
        assert!(policy.requires_approval);
        assert!(!policy.allows_mode(Mode::Alert));
    }

    #[test]
    fn read_keyword_infers_low_risk() {
        let policy = discover_policy("get_weather", "network", "Gets the current weather");
        assert_eq!(policy.risk_level, RiskLevel::Low);
        assert!(!policy.requires_approval);
        assert!(policy.allows_mode(Mode::Degraded));
    }

    #[test]
    fn unmatched_description_is_medium_risk() {
        let policy = discover_policy("translate_text", "language", "Translates text between languages");
        assert_eq!(policy.risk_level, RiskLevel::Medium);
        assert!(policy.allows_mode(Mode::Normal));
        assert!(!policy.allows_mode(Mode::Degraded));
    }
}
