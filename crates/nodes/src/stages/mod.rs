//! Model-backed implementations of the four stages.
//!
//! Every stage follows the same pattern: render its prompt from the input
//! projection, make one model call through [`ModelCall`], and parse the text
//! tolerantly into its record. Parsing never fails; only an empty response
//! is rejected as malformed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pipeline::{ModelClient, ModelOptions, StageError, StageKind, WorkflowConfig};
use tracing::{info, warn};

mod copywriter;
mod manager;
mod researcher;
mod reviewer;

pub use copywriter::Copywriter;
pub use manager::Manager;
pub use researcher::Researcher;
pub use reviewer::Reviewer;

/// A single model invocation bounded by a per-stage deadline.
///
/// Shared by all stages; holds no per-run state.
#[derive(Clone)]
pub struct ModelCall {
    client: Arc<dyn ModelClient>,
    options: ModelOptions,
    timeout: Duration,
}

impl ModelCall {
    pub fn new(client: Arc<dyn ModelClient>, options: ModelOptions, timeout: Duration) -> Self {
        Self {
            client,
            options,
            timeout,
        }
    }

    /// A call configured from `config` for `stage`.
    pub fn for_stage(client: Arc<dyn ModelClient>, config: &WorkflowConfig, stage: StageKind) -> Self {
        Self::new(
            client,
            config.model_options_for(stage),
            config.per_stage_timeout(),
        )
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `prompt` and returns the non-empty response text.
    ///
    /// # Errors
    ///
    /// - [`pipeline::StageErrorKind::Timeout`] when the deadline elapses or the
    ///   client reports a timeout.
    /// - [`pipeline::StageErrorKind::ModelUnavailable`] for any other client failure.
    /// - [`pipeline::StageErrorKind::MalformedResponse`] when the text is blank.
    pub async fn complete(&self, stage: StageKind, prompt: &str) -> Result<String, StageError> {
        let started = Instant::now();
        let outcome =
            tokio::time::timeout(self.timeout, self.client.generate(prompt, &self.options)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Err(_) => {
                warn!(stage = %stage, elapsed_ms, "model call exceeded stage deadline");
                Err(StageError::timed_out(stage, self.timeout))
            }
            Ok(Err(err)) => {
                warn!(stage = %stage, elapsed_ms, error = %err, "model call failed");
                Err(StageError::from_model(stage, &err))
            }
            Ok(Ok(text)) if text.trim().is_empty() => {
                warn!(stage = %stage, elapsed_ms, "model returned an empty response");
                Err(StageError::malformed(stage, "model returned an empty response"))
            }
            Ok(Ok(text)) => {
                info!(
                    stage = %stage,
                    elapsed_ms,
                    prompt_bytes = prompt.len(),
                    response_bytes = text.len(),
                    "model call completed"
                );
                Ok(text)
            }
        }
    }
}

impl std::fmt::Debug for ModelCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCall")
            .field("options", &self.options)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pipeline::{ModelError, ModelOptions};

    use super::*;

    /// Replays scripted responses in order and records every prompt.
    #[derive(Default)]
    pub struct ScriptedModel {
        responses: Mutex<VecDeque<Result<String, ModelError>>>,
        prompts: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl ScriptedModel {
        pub fn new<I>(responses: I) -> Self
        where
            I: IntoIterator<Item = Result<String, ModelError>>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                prompts: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub fn replying<I, S>(texts: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self::new(texts.into_iter().map(|t| Ok(t.into())))
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn generate(&self, prompt: &str, _options: &ModelOptions) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(String::new()))
        }
    }

    pub fn call(model: Arc<ScriptedModel>) -> ModelCall {
        ModelCall::new(model, ModelOptions::default(), Duration::from_secs(5))
    }
}
