//! [`ChatCompletionsClient`]: the HTTP implementation of [`ModelClient`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use pipeline::{ModelClient, ModelError, ModelErrorKind, ModelOptions, RetryPolicy};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Provider, ProviderError};

/// Default number of attempts per `generate` call, including the first.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Delay before the first retry; doubled for each further retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on any single wait, including a server's `Retry-After`.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Longest slice of an error body kept in a [`ModelError`] message.
const MAX_ERROR_DETAIL_CHARS: usize = 300;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Sends each prompt as a single user message to a chat-completions endpoint.
///
/// One instance is shared by every stage and every run; the underlying
/// `reqwest::Client` pools connections. Transient failures (rate limits,
/// timeouts, 5xx responses, connection errors) are retried with exponential
/// back-off; authentication failures never are.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    provider: Provider,
    backoff: ExponentialBuilder,
}

/// The default retry schedule: [`DEFAULT_MAX_ATTEMPTS`] attempts starting
/// from [`DEFAULT_BASE_DELAY`], with jitter.
pub fn default_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(DEFAULT_BASE_DELAY)
        .with_max_delay(MAX_RETRY_DELAY)
        .with_max_times(DEFAULT_MAX_ATTEMPTS - 1)
        .with_jitter()
}

impl ChatCompletionsClient {
    /// Creates a client for `provider` with [`default_backoff`].
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::HttpClient`] if the TLS backend cannot be
    /// initialised.
    pub fn new(provider: Provider) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            provider,
            backoff: default_backoff(),
        })
    }

    /// Replaces the retry schedule. `with_max_times(0)` disables retries.
    #[must_use]
    pub fn with_backoff(mut self, backoff: ExponentialBuilder) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// One HTTP round trip, without retry.
    async fn send_once(&self, prompt: &str, options: &ModelOptions) -> Result<String, ModelError> {
        let body = ChatRequest {
            model: self.provider.model_field(),
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature.as_f32(),
        };

        let request = self
            .provider
            .authorize(self.http.post(self.provider.completions_url()))
            .timeout(options.timeout())
            .json(&body);

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let detail = response.text().await.unwrap_or_default();
            return Err(status_error(status, retry_after, &detail));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                transport_error(e)
            } else {
                ModelError::new(
                    ModelErrorKind::Transport,
                    format!("unreadable response body: {e}"),
                )
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                ModelError::new(ModelErrorKind::Transport, "response contained no message content")
            })
    }
}

#[async_trait]
impl ModelClient for ChatCompletionsClient {
    async fn generate(&self, prompt: &str, options: &ModelOptions) -> Result<String, ModelError> {
        let started = Instant::now();
        let text = (|| self.send_once(prompt, options))
            .retry(&self.backoff)
            .when(|err: &ModelError| {
                matches!(err.retry_policy(), RetryPolicy::Retryable { .. })
            })
            .adjust(|err: &ModelError, scheduled: Option<Duration>| {
                scheduled.map(|delay| server_delay(err).unwrap_or(delay))
            })
            .notify(|err: &ModelError, delay: Duration| {
                warn!(
                    provider = self.provider.name(),
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient model error; backing off"
                );
            })
            .await?;

        debug!(
            provider = self.provider.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_bytes = text.len(),
            "chat completion received"
        );
        Ok(text)
    }
}

/// The server's `Retry-After`, capped at [`MAX_RETRY_DELAY`]. Replaces the
/// scheduled delay but never extends the attempt budget.
fn server_delay(err: &ModelError) -> Option<Duration> {
    match err.retry_policy() {
        RetryPolicy::Retryable { after } => after.map(|a| a.min(MAX_RETRY_DELAY)),
        RetryPolicy::NonRetryable => None,
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn transport_error(err: reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::new(ModelErrorKind::Timeout, format!("request timed out: {err}"))
    } else {
        ModelError::new(ModelErrorKind::Transport, format!("request failed: {err}"))
            .with_transient(err.is_connect())
    }
}

fn status_error(status: StatusCode, retry_after: Option<Duration>, body: &str) -> ModelError {
    let detail: String = body.trim().chars().take(MAX_ERROR_DETAIL_CHARS).collect();
    let message = if detail.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {detail}")
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ModelError::new(ModelErrorKind::Auth, message)
        }
        StatusCode::TOO_MANY_REQUESTS => {
            ModelError::new(ModelErrorKind::RateLimit, message).with_retry_after(retry_after)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ModelError::new(ModelErrorKind::Timeout, message)
        }
        s if s.is_server_error() => ModelError::new(ModelErrorKind::Transport, message)
            .with_transient(true)
            .with_retry_after(retry_after),
        _ => ModelError::new(ModelErrorKind::Transport, message),
    }
}

/// Reads a `Retry-After` header given in whole seconds.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use pipeline::{DeploymentName, Temperature};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn completion(text: &str) -> serde_json::Value {
        json!({ "choices": [ { "index": 0, "message": { "role": "assistant", "content": text } } ] })
    }

    fn options() -> ModelOptions {
        ModelOptions {
            max_tokens: 200,
            temperature: Temperature::default(),
            timeout_ms: 2_000,
        }
    }

    fn azure(server: &MockServer) -> ChatCompletionsClient {
        let provider = Provider::azure(
            &server.uri(),
            "secret",
            DeploymentName::new("gpt-4").unwrap(),
        )
        .unwrap();
        ChatCompletionsClient::new(provider)
            .unwrap()
            .with_backoff(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(1))
                    .with_max_times(2),
            )
    }

    #[tokio::test]
    async fn azure_request_carries_key_deployment_and_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4/chat/completions"))
            .and(query_param("api-version", "2024-02-01"))
            .and(header("api-key", "secret"))
            .and(body_partial_json(json!({
                "max_tokens": 200,
                "messages": [ { "role": "user", "content": "write a post" } ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Here it is")))
            .expect(1)
            .mount(&server)
            .await;

        let text = azure(&server).generate("write a post", &options()).await.unwrap();
        assert_eq!(text, "Here it is");
    }

    #[tokio::test]
    async fn openai_request_uses_bearer_auth_and_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = Provider::openai("sk-test", DeploymentName::new("gpt-4o-mini").unwrap())
            .unwrap()
            .with_base_url(&format!("{}/v1", server.uri()))
            .unwrap();
        let client = ChatCompletionsClient::new(provider).unwrap();

        assert_eq!(client.generate("hi", &options()).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn unauthorized_is_auth_and_never_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = azure(&server).generate("p", &options()).await.unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::Auth);
        assert!(err.message.contains("invalid key"));
    }

    #[tokio::test]
    async fn rate_limit_is_retried_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("after wait")))
            .expect(1)
            .mount(&server)
            .await;

        let text = azure(&server).generate("p", &options()).await.unwrap();
        assert_eq!(text, "after wait");
    }

    #[tokio::test]
    async fn server_errors_give_up_after_the_attempt_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let err = azure(&server).generate("p", &options()).await.unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::Transport);
        assert!(err.transient);
    }

    #[tokio::test]
    async fn client_side_bad_request_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("context length exceeded"))
            .expect(1)
            .mount(&server)
            .await;

        let err = azure(&server).generate("p", &options()).await.unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::Transport);
        assert!(!err.transient);
    }

    #[tokio::test]
    async fn missing_content_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "choices": [ { "message": { "content": null } } ] })),
            )
            .mount(&server)
            .await;

        let err = azure(&server).generate("p", &options()).await.unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::Transport);
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = azure(&server).with_backoff(ExponentialBuilder::default().with_max_times(0));
        let opts = ModelOptions {
            timeout_ms: 50,
            ..options()
        };
        let err = client.generate("p", &opts).await.unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::Timeout);
    }

    #[tokio::test]
    async fn zero_retries_sends_exactly_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = azure(&server).with_backoff(ExponentialBuilder::default().with_max_times(0));
        let err = client.generate("p", &options()).await.unwrap_err();
        assert!(err.transient);
    }

    #[test]
    fn retry_after_replaces_the_schedule_but_is_capped() {
        let limited = status_error(StatusCode::TOO_MANY_REQUESTS, Some(Duration::from_secs(4)), "");
        assert_eq!(server_delay(&limited), Some(Duration::from_secs(4)));

        let huge = status_error(StatusCode::TOO_MANY_REQUESTS, Some(Duration::from_secs(600)), "");
        assert_eq!(server_delay(&huge), Some(MAX_RETRY_DELAY));

        let unhinted = status_error(StatusCode::BAD_GATEWAY, None, "");
        assert_eq!(server_delay(&unhinted), None);

        let auth = status_error(StatusCode::UNAUTHORIZED, Some(Duration::from_secs(4)), "");
        assert_eq!(server_delay(&auth), None);
    }

    #[test]
    fn gateway_timeout_maps_to_timeout() {
        let err = status_error(StatusCode::GATEWAY_TIMEOUT, None, "");
        assert_eq!(err.kind, ModelErrorKind::Timeout);
        assert_eq!(err.message, "HTTP 504 Gateway Timeout");
    }
}
