//! The model boundary.
//!
//! Stages never construct transport-level requests. They hand a rendered
//! prompt and a set of [`ModelOptions`] to a [`ModelClient`] and get text back.
//! Concrete clients live in the `llm` crate; tests use in-memory stubs.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ModelError, Temperature};

/// Default completion budget per call.
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

/// Default HTTP-level deadline handed to the client, in milliseconds.
pub const DEFAULT_MODEL_TIMEOUT_MS: u64 = 60_000;

/// Per-call generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: Temperature,
    /// Deadline the client applies to the underlying request.
    pub timeout_ms: u64,
}

impl ModelOptions {
    /// The request deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: Temperature::default(),
            timeout_ms: DEFAULT_MODEL_TIMEOUT_MS,
        }
    }
}

/// Text generation capability shared by every stage.
///
/// Implementations must be safe for concurrent use by independent workflow
/// runs: hold no per-run state and pool connections internally. Transient
/// retry, if any, belongs inside the implementation.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generates a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] on authentication, rate-limit, timeout, or
    /// transport failure.
    async fn generate(&self, prompt: &str, options: &ModelOptions) -> Result<String, ModelError>;
}
