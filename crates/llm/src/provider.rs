//! Chat-completions providers and how to address them.

use pipeline::DeploymentName;
use thiserror::Error;

/// API version sent to Azure OpenAI when none is configured.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

/// OpenAI API root used when none is configured.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Deployment (Azure) or model (OpenAI) used when none is configured.
pub const DEFAULT_DEPLOYMENT: &str = "gpt-4";

/// A provider could not be configured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// A required setting was missing or blank.
    #[error("{setting} is required")]
    Missing {
        /// The setting's environment variable name.
        setting: &'static str,
    },

    /// An endpoint was not an absolute http(s) URL.
    #[error("{setting} must be an http(s) URL, got '{value}'")]
    InvalidUrl {
        setting: &'static str,
        value: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Where and how to send chat-completion requests.
#[derive(Clone, PartialEq, Eq)]
pub enum Provider {
    /// An Azure OpenAI deployment, authenticated with an `api-key` header.
    Azure {
        endpoint: String,
        api_key: String,
        deployment: DeploymentName,
        api_version: String,
    },
    /// The OpenAI API (or a compatible server), authenticated with a bearer token.
    OpenAi {
        base_url: String,
        api_key: String,
        model: DeploymentName,
    },
}

impl Provider {
    /// An Azure OpenAI provider using [`DEFAULT_AZURE_API_VERSION`].
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the endpoint or key is blank, or the
    /// endpoint is not an http(s) URL.
    pub fn azure(
        endpoint: &str,
        api_key: &str,
        deployment: DeploymentName,
    ) -> Result<Self, ProviderError> {
        Ok(Provider::Azure {
            endpoint: checked_url("AZURE_AI_ENDPOINT", endpoint)?,
            api_key: required("AZURE_AI_API_KEY", api_key)?,
            deployment,
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
        })
    }

    /// An OpenAI provider using [`DEFAULT_OPENAI_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Missing`] if the key is blank.
    pub fn openai(api_key: &str, model: DeploymentName) -> Result<Self, ProviderError> {
        Ok(Provider::OpenAi {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: required("OPENAI_API_KEY", api_key)?,
            model,
        })
    }

    /// Overrides the Azure API version. Ignored for OpenAI.
    #[must_use]
    pub fn with_api_version(mut self, version: &str) -> Self {
        if let Provider::Azure { api_version, .. } = &mut self {
            let version = version.trim();
            if !version.is_empty() {
                *api_version = version.to_string();
            }
        }
        self
    }

    /// Overrides the OpenAI base URL. Ignored for Azure.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidUrl`] if `url` is not an http(s) URL.
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ProviderError> {
        if let Provider::OpenAi { base_url, .. } = &mut self {
            *base_url = checked_url("OPENAI_BASE_URL", url)?;
        }
        Ok(self)
    }

    /// Short provider name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Azure { .. } => "azure",
            Provider::OpenAi { .. } => "openai",
        }
    }

    /// The deployment or model requests are served by.
    pub fn deployment(&self) -> &DeploymentName {
        match self {
            Provider::Azure { deployment, .. } => deployment,
            Provider::OpenAi { model, .. } => model,
        }
    }

    /// The API key with all but its first four characters masked.
    pub fn masked_key(&self) -> String {
        match self {
            Provider::Azure { api_key, .. } | Provider::OpenAi { api_key, .. } => {
                mask_secret(api_key)
            }
        }
    }

    /// Full URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        match self {
            Provider::Azure {
                endpoint,
                deployment,
                api_version,
                ..
            } => format!(
                "{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
            ),
            Provider::OpenAi { base_url, .. } => format!("{base_url}/chat/completions"),
        }
    }

    /// Value for the request body's `model` field; Azure infers it from the URL.
    pub(crate) fn model_field(&self) -> Option<&str> {
        match self {
            Provider::Azure { .. } => None,
            Provider::OpenAi { model, .. } => Some(model.as_str()),
        }
    }

    /// Adds the provider's authentication header.
    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Provider::Azure { api_key, .. } => request.header("api-key", api_key),
            Provider::OpenAi { api_key, .. } => request.bearer_auth(api_key),
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Azure {
                endpoint,
                deployment,
                api_version,
                ..
            } => f
                .debug_struct("Azure")
                .field("endpoint", endpoint)
                .field("api_key", &self.masked_key())
                .field("deployment", deployment)
                .field("api_version", api_version)
                .finish(),
            Provider::OpenAi {
                base_url, model, ..
            } => f
                .debug_struct("OpenAi")
                .field("base_url", base_url)
                .field("api_key", &self.masked_key())
                .field("model", model)
                .finish(),
        }
    }
}

/// Masks a secret for display, keeping at most its first four characters.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    if visible.chars().count() == secret.chars().count() {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}

fn required(setting: &'static str, value: &str) -> Result<String, ProviderError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ProviderError::Missing { setting })
    } else {
        Ok(value.to_string())
    }
}

fn checked_url(setting: &'static str, value: &str) -> Result<String, ProviderError> {
    let value = required(setting, value)?;
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(ProviderError::InvalidUrl { setting, value })
    }
}
