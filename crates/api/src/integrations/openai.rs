//! Chat-completions client used for comment rewrites.
//!
//! Sends the fixed system prompt plus the rendered rewrite prompt and
//! returns the first choice's text. Every failure, including a missing API
//! key, surfaces as [`CoreError::Internal`] so no token is ever spent.

use async_trait::async_trait;
use quill_core::error::{CoreError, CoreResult};
use quill_core::ports::TextGenerator;
use quill_core::translation::SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};

use crate::config::non_empty_env;

const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// `None` disables translation: every call fails.
    pub api_key: Option<String>,
    pub model: String,
    /// API root without trailing slash.
    pub base_url: String,
}

impl OpenAiConfig {
    /// | Env Var           | Default                     |
    /// |-------------------|-----------------------------|
    /// | `OPENAI_API_KEY`  | --                          |
    /// | `OPENAI_MODEL`    | `gpt-4`                     |
    /// | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty_env("OPENAI_API_KEY"),
            model: non_empty_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_empty_env("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> CoreResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| CoreError::Internal("OPENAI_API_KEY is not configured".into()))?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Internal(format!("text generation request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CoreError::Internal(format!(
                "text generation API error ({status}): {text}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Internal(format!("text generation response malformed: {e}")))?;

        parsed
            .into_text()
            .ok_or_else(|| CoreError::Internal("text generation returned no choices".into()))
    }
}
