//! Social Agent model client adapter.
//!
//! Implements the [`pipeline::ModelClient`] trait for chat-completions HTTP
//! APIs: Azure OpenAI deployments and the OpenAI API. Other providers are
//! added as new [`Provider`] variants without any change to the `pipeline`
//! or `nodes` crates.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, request formatting, response
//! parsing, status mapping, and exponential back-off (via `backon`) live
//! here. The
//! [`pipeline`] crate sees only [`pipeline::ModelClient`] and
//! [`pipeline::ModelError`].

mod client;
mod provider;

pub use client::{
    default_backoff, ChatCompletionsClient, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, MAX_RETRY_DELAY,
};
pub use provider::{
    mask_secret, Provider, ProviderError, DEFAULT_AZURE_API_VERSION, DEFAULT_DEPLOYMENT,
    DEFAULT_OPENAI_BASE_URL,
};
