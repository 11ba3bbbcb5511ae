use anyhow::{Context, Result, anyhow};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::LlmConfig;
use crate::llm::types::{ChatMessage, ChatRequest, ChatResponse, ChoiceMessage};
use crate::llm::{CompletionOptions, CompletionProvider, LlmErrorKind, classify_error};

#[derive(Debug, Clone)]
pub struct OpenAIClient {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub(crate) inner: reqwest::Client,
    pub llm_cfg: LlmConfig,
    /// Tracks total tokens used by this client
    pub tokens_used: Arc<AtomicU32>,
}

impl OpenAIClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let inner = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            inner,
            llm_cfg: LlmConfig::default(),
            tokens_used: Arc::new(AtomicU32::new(0)),
        })
    }

    pub fn with_llm_config(mut self, cfg: LlmConfig) -> Self {
        let builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .timeout(Duration::from_millis(cfg.request_timeout_ms));
        // Keep the existing client if the builder rejects the timeouts.
        if let Ok(c) = builder.build() {
            self.inner = c;
        }
        self.llm_cfg = cfg;
        self
    }

    pub(crate) fn endpoint(&self) -> String {
        let mut base = self.base_url.trim_end_matches('/').to_string();
        if let Some(pos) = base.rfind("/v1") {
            base.truncate(pos);
            base = base.trim_end_matches('/').to_string();
        }
        format!("{base}/v1/chat/completions")
    }

    /// Get the total number of tokens used by this client
    pub fn get_tokens_used(&self) -> u32 {
        self.tokens_used.load(Ordering::Relaxed)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .context("invalid api key header")?,
        );
        Ok(headers)
    }

    pub async fn chat_once(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<ChoiceMessage> {
        let url = self.endpoint();
        let req = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(options.temperature),
            max_tokens: Some(options.max_tokens),
            stream: None,
        };
        let headers = self.headers()?;

        if let Ok(payload) = serde_json::to_string(&req) {
            debug!(target: "llm", payload=%payload, endpoint=%url, "sending chat.completions payload");
        }

        let max_attempts = self.llm_cfg.max_retries.saturating_add(1);
        let mut last_err: Option<anyhow::Error> = None;

        for attempt in 1..=max_attempts {
            let resp = match self.inner.post(&url).headers(headers.clone()).json(&req).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    error!(attempt, err=%e, "llm chat_once send error");
                    let e = anyhow::Error::new(e).context("send chat request");
                    let kind = classify_error(None, &e);
                    if should_retry(&kind) && attempt < max_attempts {
                        let wait = self.backoff_delay(attempt, None);
                        info!(attempt, kind=?kind, wait_ms=%wait.as_millis(), "retrying chat_once");
                        tokio::time::sleep(wait).await;
                        last_err = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let retry_after = resp
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok());
                let text = resp.text().await.unwrap_or_default();

                error!(attempt, status=%status.as_u16(), body=%text, "llm chat_once non-success status");
                let e = anyhow!("chat error: {} - {}", status, text);
                let kind = classify_error(Some(status), &e);
                if should_retry(&kind) && attempt < max_attempts {
                    let wait = self.backoff_delay(attempt, retry_after);
                    info!(attempt, kind=?kind, wait_ms=%wait.as_millis(), "retrying chat_once");
                    tokio::time::sleep(wait).await;
                    last_err = Some(e);
                    continue;
                }
                return Err(e);
            }

            let response_text = resp.text().await.context("read chat response body")?;
            match serde_json::from_str::<ChatResponse>(&response_text) {
                Ok(body) => {
                    if let Some(usage) = &body.usage {
                        self.tokens_used
                            .fetch_add(usage.total_tokens, Ordering::Relaxed);
                    }
                    return body
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message)
                        .ok_or_else(|| anyhow!("no choices returned"));
                }
                Err(e) => {
                    warn!(attempt, err=%e, "llm chat_once deserialize error");
                    let e = anyhow::Error::new(e).context("parse chat response");
                    if attempt < max_attempts {
                        tokio::time::sleep(self.backoff_delay(attempt, None)).await;
                        last_err = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("unknown error")))
    }

    pub(crate) fn backoff_delay(&self, attempt: usize, retry_after_secs: Option<u64>) -> Duration {
        if self.llm_cfg.respect_retry_after
            && let Some(secs) = retry_after_secs
        {
            return Duration::from_secs(secs);
        }
        let base = self.llm_cfg.retry_base_ms;
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let exp = base.saturating_mul(1u64 << shift);
        let jitter = self.llm_cfg.retry_jitter_ms as i64;
        let half = jitter / 2;
        let rnd = fastrand::i64(-half..=half).max(0) as u64;
        Duration::from_millis(exp.saturating_add(rnd))
    }
}

pub(crate) fn should_retry(kind: &LlmErrorKind) -> bool {
    matches!(
        kind,
        LlmErrorKind::RateLimited
            | LlmErrorKind::Server
            | LlmErrorKind::Network
            | LlmErrorKind::Timeout
    )
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAIClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let message = self
            .chat_once(vec![ChatMessage::user(prompt)], options)
            .await?;
        Ok(message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{Expectation, Server, matchers::*, responders::*};

    fn test_config(max_retries: usize) -> LlmConfig {
        LlmConfig {
            connect_timeout_ms: 5_000,
            request_timeout_ms: 5_000,
            max_retries,
            retry_base_ms: 1,
            retry_jitter_ms: 0,
            respect_retry_after: false,
        }
    }

    #[test]
    fn test_endpoint_normalizes_base_url() {
        let client = OpenAIClient::new("https://api.example.com/v1/", "k", "m").unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.example.com/v1/chat/completions"
        );
        let client = OpenAIClient::new("http://localhost:8080", "k", "m").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_backoff_respects_retry_after() {
        let client = OpenAIClient::new("http://localhost", "k", "m")
            .unwrap()
            .with_llm_config(LlmConfig {
                respect_retry_after: true,
                ..test_config(1)
            });
        assert_eq!(client.backoff_delay(1, Some(3)), Duration::from_secs(3));
        assert_eq!(client.backoff_delay(3, None), Duration::from_millis(4));
    }

    #[tokio::test]
    async fn complete_happy_path() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v1/chat/completions"),
                request::headers(contains(key("authorization"))),
            ])
            .respond_with(json_encoded(serde_json::json!({
                "id": "test",
                "choices": [
                    {"index":0, "message": {"role":"assistant","content":"[]"}}
                ],
                "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
            }))),
        );

        let client = OpenAIClient::new(format!("{}/", server.url_str("")), "test-key", "gpt-test")
            .unwrap()
            .with_llm_config(test_config(0));
        let text = client
            .complete("hi", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "[]");
        assert_eq!(client.get_tokens_used(), 12);
    }

    #[tokio::test]
    async fn complete_retries_on_500_then_succeeds() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .times(2)
                .respond_with(httptest::cycle![
                    status_code(500).body("oops"),
                    json_encoded(serde_json::json!({
                        "id": "test",
                        "choices": [
                            {"index":0, "message": {"role":"assistant","content":"ok"}}
                        ]
                    })),
                ]),
        );

        let client = OpenAIClient::new(server.url_str(""), "x", "gpt")
            .unwrap()
            .with_llm_config(test_config(1));
        let text = client
            .complete("hi", &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn complete_does_not_retry_on_400() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
                .times(1)
                .respond_with(status_code(400).body("bad")),
        );

        let client = OpenAIClient::new(server.url_str(""), "x", "gpt")
            .unwrap()
            .with_llm_config(test_config(3));
        let err = client
            .complete("hi", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(format!("{err}").contains("400"));
    }
}
