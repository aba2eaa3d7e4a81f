//! Model runtime boundary.
//!
//! The [`TextGenerator`] trait is the single seam between the workflow and
//! the external text-generation service; its `generate` method is also the
//! one place where the runtime's response wrappers are normalized to plain
//! text.
//!
//! [`OllamaRuntime`] talks to a local Ollama server and supervises it as a
//! dependency: `ensure_ready` probes the server, spawns `ollama serve`
//! once if it is down, polls a bounded number of times for it to come up,
//! and pulls the configured model if it is not present locally.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;

const HEALTH_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 500;

/// Synchronous text generation against the external model runtime.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Submit a prompt and return the model's response as plain text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Client for a locally hosted Ollama server.
pub struct OllamaRuntime {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    spawn_if_down: bool,
    startup_poll_attempts: u32,
}

impl OllamaRuntime {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            spawn_if_down: config.spawn_if_down,
            startup_poll_attempts: config.startup_poll_attempts,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Lightweight health probe. Ollama answers 200 on the root path and
    /// has no dedicated health route.
    pub async fn is_up(&self) -> bool {
        let url = format!("{}/", self.endpoint);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Make sure the runtime is reachable and the configured model is
    /// available locally.
    ///
    /// If the server is down and `spawn_if_down` is set, spawns
    /// `ollama serve` detached and polls a bounded number of times — the
    /// recovery is attempted once, not retried indefinitely.
    pub async fn ensure_ready(&self) -> Result<()> {
        if self.is_up().await {
            debug!("model runtime is up at {}", self.endpoint);
        } else {
            if !self.spawn_if_down {
                bail!("Model runtime is not reachable at {}", self.endpoint);
            }
            info!("model runtime not running, starting `ollama serve`");
            Command::new("ollama")
                .arg("serve")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| {
                    anyhow!("Ollama executable not found or failed to start: {}", e)
                })?;

            let mut up = false;
            for attempt in 0..self.startup_poll_attempts {
                tokio::time::sleep(Duration::from_millis(STARTUP_POLL_INTERVAL_MS)).await;
                if self.is_up().await {
                    up = true;
                    break;
                }
                debug!(attempt, "waiting for model runtime to come up");
            }
            if !up {
                bail!(
                    "Model runtime did not become ready at {} after startup",
                    self.endpoint
                );
            }
            info!("model runtime started");
        }

        self.ensure_model().await
    }

    /// Check whether `name` is present in the runtime's local model list.
    pub async fn model_present(&self, name: &str) -> Result<bool> {
        let url = format!("{}/api/tags", self.endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Model list request failed")?;

        if !response.status().is_success() {
            bail!("Model list API error: {}", response.status());
        }

        let tags: TagsResponse = response.json().await.context("Invalid model list response")?;
        let present = tags.models.unwrap_or_default().iter().any(|m| {
            m.name == name || m.name.split(':').next() == Some(name)
        });
        Ok(present)
    }

    async fn ensure_model(&self) -> Result<()> {
        if self.model_present(&self.model).await? {
            debug!("model '{}' already present", self.model);
            return Ok(());
        }

        info!("model '{}' not found locally, pulling", self.model);
        let body = serde_json::json!({
            "name": self.model,
            "stream": false,
        });
        let response = self
            .client
            .post(format!("{}/api/pull", self.endpoint))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to pull model '{}'", self.model))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("Model pull failed for '{}': {} {}", self.model, status, text);
        }

        info!("model '{}' pulled", self.model);
        Ok(())
    }
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Option<Vec<ModelTag>>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// Response from `/api/generate` (generate shape) or `/api/chat`
/// (chat shape). Only one of the two fields is populated.
#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl TextGenerator for OllamaRuntime {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": self.temperature },
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&body)
            .send()
            .await
            .context("Generation request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("generation API error {}: {}", status, text);
            bail!("Generation API error {}: {}", status, text);
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Invalid generation response")?;

        // normalize either response wrapper to plain text
        if let Some(text) = parsed.response {
            return Ok(text);
        }
        if let Some(message) = parsed.message {
            return Ok(message.content);
        }
        bail!("Model runtime returned no text")
    }
}
