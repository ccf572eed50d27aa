//! Remote model gateway
//!
//! This module owns everything that crosses the network: the two-phase
//! attachment upload protocol, the streaming chat turn protocol, and the
//! best-effort token-count request. The conversation context accumulated
//! across turns lives in [`ChatContext`], an opaque handle owned by the
//! session orchestrator.

pub mod stream;
pub mod types;
mod upload;

pub use stream::TurnStream;
pub use types::{Content, FinishReason, Part, StoredFile, TokenUsage, TurnDelta};

use crate::config::GatewayConfig;
use crate::error::{DocuchatError, Result};
use crate::prompts::SYSTEM_INSTRUCTION;
use reqwest::StatusCode;
use std::time::Duration;
use types::{
    permissive_safety_settings, CountTokensRequest, CountTokensResponse, GenerateContentRequest,
    GenerationConfig,
};

/// Client for the remote model API
///
/// Holds no credential; the orchestrator passes the current credential
/// with each call so that a credential change never leaves a stale token
/// captured here.
#[derive(Debug, Clone)]
pub struct ModelGateway {
    http: reqwest::Client,
    api_base: String,
    model: String,
    generation: GenerationConfig,
}

impl ModelGateway {
    /// Build a gateway from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            generation: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            },
        })
    }

    /// The currently selected model id
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Select a different model for subsequent turns
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub(crate) fn api_base(&self) -> &str {
        &self.api_base
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn model_url(&self, operation: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.api_base, self.model, operation)
    }

    /// Open a streaming chat turn
    ///
    /// Sends the accumulated history plus the new content under the fixed
    /// system instruction, safety configuration, and generation
    /// parameters, and returns the response as an ordered stream of
    /// deltas.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the credential is rejected,
    /// or a gateway error for any other non-success response.
    pub async fn stream_turn(
        &self,
        key: &str,
        context: &ChatContext,
        content: &Content,
    ) -> Result<TurnStream> {
        let request = GenerateContentRequest {
            contents: context.contents_with(content),
            system_instruction: Content::system(SYSTEM_INSTRUCTION),
            safety_settings: permissive_safety_settings(),
            generation_config: self.generation.clone(),
        };

        let response = self
            .http
            .post(self.model_url("streamGenerateContent"))
            .query(&[("alt", "sse"), ("key", key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DocuchatError::Authentication(format!(
                "remote API rejected the credential (status {})",
                status
            ))
            .into());
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DocuchatError::Gateway(format!(
                "chat turn failed with status {}: {}",
                status, detail
            ))
            .into());
        }

        Ok(stream::turn_stream(response))
    }

    /// Estimate the input tokens of a turn
    ///
    /// Counts the same content parts + system instruction the turn will
    /// send. Callers treat failure as non-fatal.
    pub async fn count_tokens(
        &self,
        key: &str,
        context: &ChatContext,
        content: &Content,
    ) -> Result<u64> {
        let request = CountTokensRequest {
            contents: context.contents_with(content),
            system_instruction: Content::system(SYSTEM_INSTRUCTION),
        };

        let response = self
            .http
            .post(self.model_url("countTokens"))
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocuchatError::Gateway(format!(
                "token count failed with status {}",
                status
            ))
            .into());
        }

        let parsed: CountTokensResponse = response.json().await?;
        Ok(parsed.total_tokens)
    }
}

/// Accumulated conversation history for the remote model
///
/// One context spans the turns of one session; discarding it forces the
/// next turn to start a fresh remote conversation with empty history.
/// Only successful turns are recorded, so a failed turn never pollutes
/// the history sent with later ones.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    history: Vec<Content>,
}

impl ChatContext {
    /// Fresh context with empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of history entries (two per recorded turn)
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True when no turn has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// The full content list for a request: history plus the new content
    fn contents_with(&self, next: &Content) -> Vec<Content> {
        let mut contents = self.history.clone();
        contents.push(next.clone());
        contents
    }

    /// Record a completed turn so later requests carry it as history
    pub fn record_turn(&mut self, user: &Content, model_text: &str) {
        self.history.push(user.clone());
        self.history.push(Content::model_text(model_text));
    }
}
