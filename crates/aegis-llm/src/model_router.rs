//! Heuristic-first model routing. Generalises the teacher's three-tier
//! `classify_task`/`select_model` pair into the four-role
//! `ROUTER/STANDARD/REASONING/CODING` scheme, with an optional LLM-backed
//! fallback for low-confidence heuristic calls.

use std::time::Duration;

use aegis_models::{ModelRole, RoutingDecision, RoutingResult};
use aegis_traits::llm::{CompletionRequest, LlmClient};

use crate::error::{LlmError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPolicy {
    HeuristicOnly,
    HeuristicThenLlm,
    LlmOnly,
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub policy: RoutingPolicy,
    pub confidence_threshold: f64,
    pub reasoning_enabled: bool,
    pub router_role_enabled: bool,
    pub llm_timeout_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            policy: RoutingPolicy::HeuristicThenLlm,
            confidence_threshold: 0.6,
            reasoning_enabled: true,
            router_role_enabled: true,
            llm_timeout_ms: 5_000,
        }
    }
}

const CODING_SIGNALS: &[&str] = &["debug", "refactor", "implement", "fix bug"];
const CODING_IDENTIFIERS: &[&str] = &["def ", "class ", "import "];
const TOOL_INTENT_SIGNALS: &[&str] = &[
    "search web",
    "look up",
    "list files",
    "read file",
    "check disk",
];
const REASONING_SIGNALS: &[&str] = &[
    "prove",
    "derive",
    "rigorously",
    "think",
    "analyze deeply",
    "research synthesis",
];

fn looks_like_code(message: &str) -> bool {
    message.contains("```")
        || message.lines().any(|line| line.trim_start().starts_with("at "))
        || CODING_IDENTIFIERS.iter().any(|id| message.contains(id))
}

/// Keyword-scoring classification, mirroring the teacher's `classify_task`
/// shape: lower-case the message once, count signal hits, pick the
/// strongest bucket.
fn heuristic_classify(message: &str) -> (ModelRole, f64, String) {
    let lower = message.to_lowercase();

    if looks_like_code(&lower) || CODING_SIGNALS.iter().any(|s| lower.contains(s)) {
        return (
            ModelRole::Coding,
            0.85,
            "code markers or coding keywords present".to_string(),
        );
    }

    if REASONING_SIGNALS.iter().any(|s| lower.contains(s)) {
        return (
            ModelRole::Reasoning,
            0.8,
            "deep-thought markers present".to_string(),
        );
    }

    if TOOL_INTENT_SIGNALS.iter().any(|s| lower.contains(s)) {
        return (
            ModelRole::Standard,
            0.75,
            "explicit tool intent keywords present".to_string(),
        );
    }

    (
        ModelRole::Standard,
        0.4,
        "no strong routing signal, defaulting to standard".to_string(),
    )
}

fn resolve_role(role: ModelRole, config: &RouterConfig) -> ModelRole {
    match role {
        ModelRole::Reasoning if !config.reasoning_enabled => ModelRole::Standard,
        ModelRole::Router if !config.router_role_enabled => ModelRole::Standard,
        other => other,
    }
}

#[derive(serde::Deserialize)]
struct RouterLlmResponse {
    target_model: Option<ModelRole>,
    confidence: f64,
    reason: String,
}

/// Decide which model role should handle a request. Channel overrides are
/// applied first and short-circuit routing entirely; otherwise the
/// heuristic result is used unless policy permits and requires an LLM call.
pub async fn route(
    message: &str,
    channel: &str,
    config: &RouterConfig,
    llm: Option<&dyn LlmClient>,
) -> Result<RoutingResult> {
    if channel.eq_ignore_ascii_case("CODE") {
        return Ok(RoutingResult {
            decision: RoutingDecision::Handle,
            target_model: Some(ModelRole::Coding),
            confidence: 1.0,
            reason: "CODE channel forces CODING".to_string(),
        });
    }
    if channel.eq_ignore_ascii_case("SYSTEM_HEALTH") {
        return Ok(RoutingResult {
            decision: RoutingDecision::Handle,
            target_model: Some(ModelRole::Standard),
            confidence: 1.0,
            reason: "SYSTEM_HEALTH channel uses STANDARD".to_string(),
        });
    }

    let (heuristic_role, heuristic_confidence, heuristic_reason) = heuristic_classify(message);

    let use_llm = !matches!(config.policy, RoutingPolicy::HeuristicOnly)
        && (matches!(config.policy, RoutingPolicy::LlmOnly)
            || heuristic_confidence < config.confidence_threshold);

    if !use_llm || llm.is_none() {
        let role = resolve_role(heuristic_role, config);
        return Ok(RoutingResult {
            decision: RoutingDecision::Delegate,
            target_model: Some(role),
            confidence: heuristic_confidence,
            reason: heuristic_reason,
        });
    }

    let llm = llm.expect("checked above");
    match call_router_llm(message, config, llm).await {
        Ok((role, confidence, reason)) => Ok(RoutingResult {
            decision: RoutingDecision::Delegate,
            target_model: Some(resolve_role(role, config)),
            confidence,
            reason,
        }),
        Err(err) => {
            let fallback_note = match err {
                LlmError::Timeout(_) => "router LLM call timed out, fell back to heuristic",
                _ => "router LLM call failed, fell back to heuristic",
            };
            Ok(RoutingResult {
                decision: RoutingDecision::Delegate,
                target_model: Some(resolve_role(heuristic_role, config)),
                confidence: heuristic_confidence,
                reason: format!("{heuristic_reason} ({fallback_note})"),
            })
        }
    }
}

async fn call_router_llm(
    message: &str,
    config: &RouterConfig,
    llm: &dyn LlmClient,
) -> Result<(ModelRole, f64, String)> {
    let prompt = format!(
        "Classify the following user message into one of STANDARD, REASONING, CODING. \
         Respond with strict JSON: {{\"target_model\": <role>, \"confidence\": <0..1>, \"reason\": <string>}}.\n\nMessage:\n{message}"
    );
    let request = CompletionRequest::new(vec![aegis_models::Message::user(prompt)]);

    let call = llm.complete(request);
    let response = tokio::time::timeout(Duration::from_millis(config.llm_timeout_ms), call)
        .await
        .map_err(|_| LlmError::Timeout(config.llm_timeout_ms))?
        .map_err(|e| LlmError::Request(e.to_string()))?;

    let content = response
        .content
        .ok_or_else(|| LlmError::SchemaMismatch("router response had no content".to_string()))?;

    let parsed: RouterLlmResponse = serde_json::from_str(&content)
        .map_err(|e| LlmError::SchemaMismatch(format!("invalid router JSON: {e}")))?;

    let target_model = parsed
        .target_model
        .ok_or_else(|| LlmError::SchemaMismatch("router response missing target_model".to_string()))?;

    Ok((target_model, parsed.confidence, parsed.reason))
}
