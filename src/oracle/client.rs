// HTTP client for OpenAI-compatible completion endpoints

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::retry::with_backoff;
use super::types::{ChatMessage, ChatRequest, ChatResponse, OracleReply, OracleRequest};
use super::Oracle;

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Oracle backed by a remote chat-completion service.
///
/// Works against any OpenAI-compatible `/v1/chat/completions` endpoint;
/// the base URL and model come from configuration.
pub struct HttpOracle {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl HttpOracle {
    pub fn new(base_url: String, api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    async fn complete_http(&self, request: &OracleRequest) -> Result<OracleReply> {
        let chat_request = ChatRequest {
            model: self.model.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stop: request.stop.clone().map(|s| vec![s]),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        tracing::debug!("Sending completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&chat_request)
            .send()
            .await
            .context("Failed to send request to completion service")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Completion request failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse completion response")?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .context("Completion service returned no choices")?;

        Ok(OracleReply {
            text: choice.message.content.unwrap_or_default(),
            natural_stop: choice.finish_reason.as_deref() == Some("stop"),
        })
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn complete_once(&self, request: &OracleRequest) -> Result<OracleReply> {
        with_backoff("completion request", || self.complete_http(request)).await
    }

    fn name(&self) -> &str {
        "http"
    }
}
