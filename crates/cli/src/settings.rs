//! Turns parsed arguments into the objects the workflow is built from.

use std::time::Duration;

use anyhow::{anyhow, Context};
use llm::{mask_secret, Provider};
use pipeline::{ConfigError, DeploymentName, ModelOptions, Temperature, WorkflowConfig};

use crate::args::{ModelArgs, ProviderKind, WorkflowArgs};

impl WorkflowArgs {
    /// Builds and validates the orchestrator configuration.
    ///
    /// The HTTP deadline handed to the model client matches the per-stage
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an out-of-range temperature or a zero
    /// timeout or token budget.
    pub fn to_config(&self) -> Result<WorkflowConfig, ConfigError> {
        let temperature = Temperature::new(self.temperature).ok_or_else(|| {
            ConfigError::new(
                "MODEL_TEMPERATURE",
                format!("{} is outside 0.0..=2.0", self.temperature),
            )
        })?;

        let mut config =
            WorkflowConfig::from_workflow_timeout(Duration::from_secs(self.workflow_timeout_secs))
                .with_max_retries(self.max_retries);
        if let Some(ms) = self.per_stage_timeout_ms {
            config = config.with_per_stage_timeout(Duration::from_millis(ms));
        }

        let timeout_ms = u64::try_from(config.per_stage_timeout().as_millis()).unwrap_or(u64::MAX);
        let config = config.with_model_options(ModelOptions {
            max_tokens: self.max_tokens,
            temperature,
            timeout_ms,
        });

        config.validate()?;
        Ok(config)
    }
}

impl ModelArgs {
    /// Which provider the settings select, if any is configured.
    ///
    /// An explicit `MODEL_PROVIDER` wins; otherwise Azure is chosen when an
    /// Azure endpoint is set, then OpenAI when an OpenAI key is set.
    pub fn selected_provider(&self) -> Option<ProviderKind> {
        self.provider.or_else(|| {
            if is_set(&self.azure_endpoint) {
                Some(ProviderKind::Azure)
            } else if is_set(&self.openai_api_key) {
                Some(ProviderKind::OpenAi)
            } else {
                None
            }
        })
    }

    /// Builds the selected provider.
    ///
    /// # Errors
    ///
    /// Fails when no provider is configured or a required setting is missing.
    pub fn to_provider(&self) -> anyhow::Result<Provider> {
        let kind = self.selected_provider().ok_or_else(|| {
            anyhow!("no model provider configured; set AZURE_AI_ENDPOINT and AZURE_AI_API_KEY, or OPENAI_API_KEY")
        })?;

        let provider = match kind {
            ProviderKind::Azure => Provider::azure(
                self.azure_endpoint.as_deref().unwrap_or_default(),
                self.azure_api_key.as_deref().unwrap_or_default(),
                deployment("AZURE_AI_DEPLOYMENT_NAME", &self.deployment)?,
            )?
            .with_api_version(&self.api_version),
            ProviderKind::OpenAi => Provider::openai(
                self.openai_api_key.as_deref().unwrap_or_default(),
                deployment("OPENAI_MODEL", &self.openai_model)?,
            )?
            .with_base_url(&self.openai_base_url)?,
        };
        Ok(provider)
    }

    /// Lines describing the provider settings, with keys masked.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let or_unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());
        match self.selected_provider() {
            None => vec![("provider", "(not configured)".to_string())],
            Some(ProviderKind::Azure) => vec![
                ("provider", "azure".to_string()),
                ("endpoint", or_unset(&self.azure_endpoint)),
                ("deployment", self.deployment.clone()),
                ("api version", self.api_version.clone()),
                ("api key", mask_secret(self.azure_api_key.as_deref().unwrap_or_default())),
            ],
            Some(ProviderKind::OpenAi) => vec![
                ("provider", "openai".to_string()),
                ("base url", self.openai_base_url.clone()),
                ("model", self.openai_model.clone()),
                ("api key", mask_secret(self.openai_api_key.as_deref().unwrap_or_default())),
            ],
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn deployment(setting: &str, value: &str) -> anyhow::Result<DeploymentName> {
    DeploymentName::new(value).with_context(|| format!("{setting} must not be blank"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Cli;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(
            ["social-agent"]
                .into_iter()
                .chain(args.iter().copied())
                .chain(["config"]),
        )
        .unwrap()
    }

    #[test]
    fn per_stage_timeout_defaults_to_a_quarter_of_the_workflow_timeout() {
        let config = cli(&["--workflow-timeout", "120"]).workflow.to_config().unwrap();
        assert_eq!(config.per_stage_timeout(), Duration::from_secs(30));
        assert_eq!(config.model_options().timeout_ms, 30_000);
    }

    #[test]
    fn explicit_per_stage_timeout_wins() {
        let config = cli(&["--per-stage-timeout-ms", "1500", "--max-retries", "0"])
            .workflow
            .to_config()
            .unwrap();
        assert_eq!(config.per_stage_timeout(), Duration::from_millis(1500));
        assert_eq!(config.max_retries(), 0);
    }

    #[test]
    fn out_of_range_temperature_is_rejected() {
        let err = cli(&["--temperature", "3.5"]).workflow.to_config().unwrap_err();
        assert_eq!(err.field, "MODEL_TEMPERATURE");
    }

    #[test]
    fn zero_token_budget_is_rejected() {
        let err = cli(&["--max-tokens", "0"]).workflow.to_config().unwrap_err();
        assert_eq!(err.field, "max_tokens");
    }

    #[test]
    fn azure_is_selected_from_its_endpoint() {
        let args = cli(&[
            "--azure-endpoint",
            "https://acme.openai.azure.com",
            "--azure-api-key",
            "abcdef123",
        ])
        .model;
        assert_eq!(args.selected_provider(), Some(ProviderKind::Azure));

        let provider = args.to_provider().unwrap();
        assert_eq!(provider.name(), "azure");
        assert!(provider.completions_url().contains("/deployments/"));
        assert!(args
            .describe()
            .contains(&("api key", "abcd****".to_string())));
    }

    #[test]
    fn selected_provider_without_key_fails() {
        let args = cli(&["--provider", "openai", "--openai-api-key", " "]).model;
        assert!(args.to_provider().is_err());
    }
}
