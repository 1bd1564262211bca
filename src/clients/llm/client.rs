use std::fmt;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::util::redact::redact;
use crate::util::text::truncate_error_message;

use super::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, CompletionOptions};

/// 補完エンドポイントへの呼び出しインタフェース。
///
/// プロンプトを1回送信し、アシスタントの生テキストを返す。リトライは行わない。
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI互換（Groq等）の chat completions クライアント。
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client,
    base_url: Url,
    api_key: String,
    options: CompletionOptions,
}

impl ChatCompletionClient {
    /// # Errors
    /// HTTPクライアントの構築やベースURLの解釈に失敗した場合はエラーを返す。
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: CompletionOptions,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .context("failed to build completion client")?;

        let mut raw = base_url.into();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw).context("invalid completion base URL")?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            options,
        })
    }
}

impl fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &redact(&self.api_key))
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = self
            .base_url
            .join("chat/completions")
            .context("failed to build chat completions URL")?;

        let request = ChatCompletionRequest {
            model: &self.options.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        debug!(
            model = %self.options.model,
            temperature = self.options.temperature,
            max_tokens = self.options.max_tokens,
            "sending classification request to completion endpoint"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("chat completion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let truncated_body = truncate_error_message(&body);
            return Err(anyhow!(
                "chat completion endpoint returned error status {status}: {truncated_body}"
            ));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("failed to deserialize chat completion response")?;

        if let Some(usage) = completion.usage {
            debug!(
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                "completion usage reported by provider"
            );
        }

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| anyhow!("chat completion response contained no message content"))
    }
}
