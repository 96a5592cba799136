//! The delegated workload that runs once the gate allows it.
//!
//! The gate only needs something it can run once and get text back from;
//! [`ChatAgentWorkload`] is the production implementation and hands a single
//! agent prompt to an OpenAI-compatible chat-completions endpoint.

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GateConfig;
use crate::errors::{GateError, GateResult};

/// Something the gate invokes exactly once on the allowed path.
pub trait Workload {
    fn run(&self) -> impl Future<Output = GateResult<String>> + Send;
}

/// Name and system instructions of the worker agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub name: String,
    pub instructions: String,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: "Swarm Worker".to_string(),
            instructions: concat!(
                "You create short, practical 3-step plans for developers using OpenAI Swarm together with MachineID. ",
                "MachineID is a lightweight device-level gate: each worker has a deviceId, registers once, and validates ",
                "before running tasks so teams can enforce simple device limits and prevent runaway scaling.\n\n",
                "Focus ONLY on:\n",
                "- assigning a deviceId per worker,\n",
                "- registering the worker,\n",
                "- validating before work, and\n",
                "- stopping workers when validation fails or limits are reached.\n\n",
                "Do NOT describe MachineID as monitoring, analytics, observability, or spend tracking."
            )
            .to_string(),
        }
    }
}

/// User message sent to the worker agent.
pub const DEFAULT_PROMPT: &str = concat!(
    "Give me a simple, accurate 3-step plan showing how to use OpenAI Swarm workers with MachineID ",
    "to keep scaling under control. Focus ONLY on deviceId, register, validate, and stopping workers ",
    "when validation fails or limits are reached."
);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// Runs one agent turn against a chat-completions backend.
#[derive(Debug, Clone)]
pub struct ChatAgentWorkload {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    agent: AgentProfile,
    prompt: String,
}

impl ChatAgentWorkload {
    /// Build the workload from config. Fails when no API key is configured.
    pub fn from_config(config: &GateConfig) -> GateResult<Self> {
        let agent = &config.agent;
        if agent.api_key.trim().is_empty() {
            return Err(GateError::Config(
                "Missing OPENAI_API_KEY.\n\
                 Example:\n  export MACHINEID_ORG_KEY=org_your_key_here\n  \
                 export OPENAI_API_KEY=sk_your_openai_key_here"
                    .to_string(),
            ));
        }

        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", agent.api_base.trim_end_matches('/')),
            api_key: agent.api_key.clone(),
            model: agent.model.clone(),
            agent: AgentProfile::default(),
            prompt: DEFAULT_PROMPT.to_string(),
        })
    }

    pub fn with_agent(mut self, agent: AgentProfile) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn agent(&self) -> &AgentProfile {
        &self.agent
    }

    fn request(&self) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(self.agent.instructions.clone()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(self.prompt.clone()),
                },
            ],
        }
    }
}

impl Workload for ChatAgentWorkload {
    async fn run(&self) -> GateResult<String> {
        info!(agent = %self.agent.name, model = %self.model, "Starting agent run");

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            // OpenAI-style errors: {"error": {"message": "..."}}
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(GateError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let mut parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            GateError::InvalidResponse(format!("Failed to parse chat completion: {e}"))
        })?;

        let content = parsed
            .choices
            .pop()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GateError::InvalidResponse("chat completion had no content".into()))?;

        debug!(chars = content.len(), "Agent run finished");
        Ok(content)
    }
}
