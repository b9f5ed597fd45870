//! Orchestrator configuration.
//!
//! Read once when an orchestrator is constructed. Values come from the
//! composition root (flags, environment, `.env`); this module only defines
//! the recognised options, their defaults, and validation.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::{ConfigError, ModelOptions, StageKind};

/// Default number of regenerations after the first draft (three drafts total).
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default overall workflow timeout.
pub const DEFAULT_WORKFLOW_TIMEOUT: Duration = Duration::from_secs(300);

/// Number of model-backed stages; the overall timeout is split evenly
/// between them to derive the per-stage default.
const STAGE_COUNT: u32 = 4;

/// Recognised orchestrator options.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    max_retries: u32,
    per_stage_timeout: Duration,
    model_options: ModelOptions,
    stage_options: BTreeMap<StageKind, ModelOptions>,
}

impl WorkflowConfig {
    /// Configuration whose per-stage timeout is a quarter of `workflow_timeout`.
    pub fn from_workflow_timeout(workflow_timeout: Duration) -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            per_stage_timeout: workflow_timeout / STAGE_COUNT,
            model_options: ModelOptions::default(),
            stage_options: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_per_stage_timeout(mut self, timeout: Duration) -> Self {
        self.per_stage_timeout = timeout;
        self
    }

    /// Sets the model options used by every stage without an override.
    #[must_use]
    pub fn with_model_options(mut self, options: ModelOptions) -> Self {
        self.model_options = options;
        self
    }

    /// Overrides the model options for one stage.
    #[must_use]
    pub fn with_stage_options(mut self, stage: StageKind, options: ModelOptions) -> Self {
        self.stage_options.insert(stage, options);
        self
    }

    /// Maximum regenerations after the first draft.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Deadline applied to each stage's model call.
    pub fn per_stage_timeout(&self) -> Duration {
        self.per_stage_timeout
    }

    /// Default model options.
    pub fn model_options(&self) -> &ModelOptions {
        &self.model_options
    }

    /// Model options for `stage`, honouring per-stage overrides.
    pub fn model_options_for(&self, stage: StageKind) -> ModelOptions {
        self.stage_options
            .get(&stage)
            .copied()
            .unwrap_or(self.model_options)
    }

    /// Checks the configuration for values no run could succeed with.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_stage_timeout.is_zero() {
            return Err(ConfigError::new(
                "per_stage_timeout",
                "must be greater than zero",
            ));
        }

        let all = std::iter::once((None, &self.model_options))
            .chain(self.stage_options.iter().map(|(k, v)| (Some(*k), v)));
        for (stage, options) in all {
            let prefix = stage.map(|s| format!("{s}.")).unwrap_or_default();
            if options.max_tokens == 0 {
                return Err(ConfigError::new(
                    format!("{prefix}max_tokens"),
                    "must be greater than zero",
                ));
            }
            if options.timeout_ms == 0 {
                return Err(ConfigError::new(
                    format!("{prefix}timeout_ms"),
                    "must be greater than zero",
                ));
            }
        }
        Ok(())
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self::from_workflow_timeout(DEFAULT_WORKFLOW_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_split_the_workflow_timeout_across_stages() {
        let config = WorkflowConfig::default();
        assert_eq!(config.max_retries(), 2);
        assert_eq!(config.per_stage_timeout(), Duration::from_secs(75));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stage_overrides_take_precedence() {
        let long = ModelOptions {
            max_tokens: 3000,
            ..ModelOptions::default()
        };
        let config = WorkflowConfig::default().with_stage_options(StageKind::Researcher, long);

        assert_eq!(config.model_options_for(StageKind::Researcher).max_tokens, 3000);
        assert_eq!(
            config.model_options_for(StageKind::Reviewer),
            ModelOptions::default()
        );
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let config = WorkflowConfig::default().with_per_stage_timeout(Duration::ZERO);
        assert_eq!(config.validate().unwrap_err().field, "per_stage_timeout");

        let bad = ModelOptions {
            timeout_ms: 0,
            ..ModelOptions::default()
        };
        let config = WorkflowConfig::default().with_stage_options(StageKind::Manager, bad);
        assert_eq!(config.validate().unwrap_err().field, "manager.timeout_ms");
    }
}
