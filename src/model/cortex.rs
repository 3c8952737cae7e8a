//! Cortex model invoker
//!
//! Calls the warehouse's hosted LLM through its REST complete endpoint.
//! Built with `--features cortex`; without it the invoker reports itself
//! unavailable.

use serde::{Deserialize, Serialize};

use super::invoker::{InvocationError, ModelInvoker};
use crate::config::{ConnectionConfig, CortexConfig};
use crate::request::ModelId;

const COMPLETE_PATH: &str = "/api/v2/cortex/inference:complete";

#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompleteResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceContent>,
    #[serde(default)]
    delta: Option<ChoiceContent>,
    #[serde(default)]
    messages: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceContent {
    #[serde(default)]
    content: Option<String>,
}

impl Choice {
    fn text(self) -> Option<String> {
        self.message
            .and_then(|m| m.content)
            .or_else(|| self.delta.and_then(|d| d.content))
            .or(self.messages)
    }
}

/// Cortex REST invoker
#[cfg_attr(not(feature = "cortex"), allow(dead_code))]
pub struct CortexInvoker {
    base_url: String,
    token: String,
    role: Option<String>,
    timeout_ms: u64,
}

impl CortexInvoker {
    /// Build from caller-owned connection settings
    pub fn new(connection: &ConnectionConfig, cortex: &CortexConfig) -> Self {
        let base_url = cortex
            .base_url
            .clone()
            .unwrap_or_else(|| connection.account_url());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: connection.password.clone(),
            role: connection.role.clone(),
            timeout_ms: cortex.timeout_ms,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, COMPLETE_PATH)
    }

    #[cfg(feature = "cortex")]
    fn send(&self, body: &CompleteRequest<'_>) -> Result<String, InvocationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .build()
            .map_err(|e| InvocationError::Connection {
                message: e.to_string(),
            })?;

        let mut request = client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .header(
                "X-Snowflake-Authorization-Token-Type",
                "PROGRAMMATIC_ACCESS_TOKEN",
            )
            .header(reqwest::header::ACCEPT, "application/json, text/event-stream")
            .json(body);
        if let Some(role) = &self.role {
            request = request.header("X-Snowflake-Role", role);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                InvocationError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                InvocationError::Connection {
                    message: format!("cannot reach {}: {}", self.base_url, e),
                }
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| InvocationError::InvalidResponse {
                reason: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(InvocationError::Status {
                status: status.as_u16(),
                body: text.chars().take(500).collect(),
            });
        }

        Ok(text)
    }

    #[cfg(not(feature = "cortex"))]
    fn send(&self, _body: &CompleteRequest<'_>) -> Result<String, InvocationError> {
        Err(InvocationError::Unavailable {
            reason: "Cortex support not compiled. Build with --features cortex".to_string(),
        })
    }
}

impl ModelInvoker for CortexInvoker {
    fn name(&self) -> &str {
        "cortex"
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "cortex")
    }

    fn invoke(&self, instruction: &str, model: ModelId) -> Result<String, InvocationError> {
        let body = CompleteRequest {
            model: model.as_str(),
            messages: vec![Message {
                role: "user",
                content: instruction,
            }],
            stream: false,
        };

        tracing::debug!(model = %model, endpoint = %self.endpoint(), "calling cortex complete");
        let raw = self.send(&body)?;
        parse_completion(&raw)
    }
}

/// Pull the generated text out of a complete-endpoint body.
///
/// Accepts a single JSON document or a server-sent event stream whose
/// `data:` lines each carry a chunk.
pub fn parse_completion(body: &str) -> Result<String, InvocationError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(InvocationError::EmptyResponse);
    }

    let text = if trimmed.starts_with('{') {
        let response: CompleteResponse =
            serde_json::from_str(trimmed).map_err(|e| InvocationError::InvalidResponse {
                reason: e.to_string(),
            })?;
        collect_choices(response)
    } else {
        let mut text = String::new();
        for line in trimmed.lines() {
            let Some(data) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() || data == "[DONE]" {
                continue;
            }
            let chunk: CompleteResponse =
                serde_json::from_str(data).map_err(|e| InvocationError::InvalidResponse {
                    reason: format!("bad event chunk: {}", e),
                })?;
            text.push_str(&collect_choices(chunk));
        }
        text
    };

    if text.trim().is_empty() {
        return Err(InvocationError::EmptyResponse);
    }
    Ok(text)
}

fn collect_choices(response: CompleteResponse) -> String {
    response
        .choices
        .into_iter()
        .filter_map(Choice::text)
        .collect::<Vec<_>>()
        .join("")
}
