//! Thin HTTP client over the core's `/sessions` and `/chat` surface.
//! Grounded on `restflow-server/src/daemon_client.rs`'s `DaemonClient`: one
//! `reqwest::Client` plus a base URL, no retry/backoff here — the core
//! already retries its own upstream LLM calls, so a failure reaching this
//! layer is already final.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CoreClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest {
    channel: String,
    mode: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub channel: String,
    pub mode: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SessionDetail {
    pub session_id: Uuid,
    pub channel: String,
    pub mode: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub response: String,
    pub trace_id: Uuid,
    #[serde(default)]
    pub usage: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(default)]
    trace_id: Option<Uuid>,
}

impl CoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn map_error(response: reqwest::Response) -> anyhow::Error {
        let status = response.status();
        match response.json::<ErrorEnvelope>().await {
            Ok(body) => match body.error.trace_id {
                Some(trace_id) => anyhow::anyhow!(
                    "request failed: {} {} ({}) [trace {trace_id}]",
                    status,
                    body.error.message,
                    body.error.code
                ),
                None => anyhow::anyhow!(
                    "request failed: {} {} ({})",
                    status,
                    body.error.message,
                    body.error.code
                ),
            },
            Err(_) => anyhow::anyhow!("request failed: {status}"),
        }
    }

    pub async fn create_session(
        &self,
        channel: &str,
        mode: &str,
    ) -> anyhow::Result<CreateSessionResponse> {
        let response = self
            .http
            .post(format!("{}/sessions", self.base_url))
            .json(&CreateSessionRequest {
                channel: channel.to_string(),
                mode: mode.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::map_error(response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn get_session(&self, session_id: Uuid) -> anyhow::Result<SessionDetail> {
        let response = self
            .http
            .get(format!("{}/sessions/{session_id}", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::map_error(response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn chat(
        &self,
        message: &str,
        session_id: Option<Uuid>,
        compress: bool,
    ) -> anyhow::Result<ChatResponse> {
        let mut query = vec![("message", message.to_string())];
        if let Some(id) = session_id {
            query.push(("session_id", id.to_string()));
        }
        if compress {
            query.push(("compress", "true".to_string()));
        }

        let response = self
            .http
            .post(format!("{}/chat", self.base_url))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::map_error(response).await);
        }
        Ok(response.json().await?)
    }
}
