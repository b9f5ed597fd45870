//! The immutable input to a workflow run.
//!
//! A [`WorkflowRequest`] is built once, validated, and handed to the
//! orchestrator. Every free-text field has a documented fallback so the
//! request is always complete; only the topic is mandatory.

use serde::{Deserialize, Serialize};

use crate::{Platform, RequestError, Topic};

/// Fallback audience description.
pub const DEFAULT_AUDIENCE: &str = "general audience";
/// Fallback content type.
pub const DEFAULT_CONTENT_TYPE: &str = "general post";
/// Fallback tone.
pub const DEFAULT_TONE: &str = "engaging and professional";
/// Fallback marketing goals.
pub const DEFAULT_GOALS: &str = "increase engagement";
/// Fallback promotion budget.
pub const DEFAULT_BUDGET: &str = "organic only";
/// Fallback brand guidelines.
pub const DEFAULT_BRAND_GUIDELINES: &str = "maintain professional and authentic tone";
/// Fallback compliance requirements.
pub const DEFAULT_COMPLIANCE: &str = "standard social media policies";
/// Fallback call to action.
pub const DEFAULT_CALL_TO_ACTION: &str = "engage with the content";
/// Industry label used in prompts when none was given.
pub const DEFAULT_INDUSTRY: &str = "general";

/// What to create and for whom.
///
/// Fields are private; the value never changes after [`WorkflowRequestBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    topic: Topic,
    platform: Platform,
    audience: String,
    content_type: String,
    tone: String,
    goals: String,
    budget: String,
    brand_guidelines: String,
    compliance: String,
    call_to_action: String,
    industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    personal_style: Option<String>,
}

impl WorkflowRequest {
    /// Starts a request for `topic`. Validation happens in
    /// [`WorkflowRequestBuilder::build`].
    pub fn builder(topic: impl Into<String>) -> WorkflowRequestBuilder {
        WorkflowRequestBuilder {
            topic: topic.into(),
            ..WorkflowRequestBuilder::default()
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn tone(&self) -> &str {
        &self.tone
    }

    pub fn goals(&self) -> &str {
        &self.goals
    }

    pub fn budget(&self) -> &str {
        &self.budget
    }

    pub fn brand_guidelines(&self) -> &str {
        &self.brand_guidelines
    }

    pub fn compliance(&self) -> &str {
        &self.compliance
    }

    pub fn call_to_action(&self) -> &str {
        &self.call_to_action
    }

    /// The industry, if one was supplied.
    pub fn industry(&self) -> Option<&str> {
        self.industry.as_deref()
    }

    /// The author's own writing-style guidelines, if any. The copywriter
    /// follows them on every draft.
    pub fn personal_style(&self) -> Option<&str> {
        self.personal_style.as_deref()
    }

    /// The industry label for prompts, falling back to [`DEFAULT_INDUSTRY`].
    pub fn industry_or_default(&self) -> &str {
        self.industry.as_deref().unwrap_or(DEFAULT_INDUSTRY)
    }
}

/// Collects request fields; blank or absent fields take their defaults.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRequestBuilder {
    topic: String,
    platform: Option<String>,
    audience: Option<String>,
    content_type: Option<String>,
    tone: Option<String>,
    goals: Option<String>,
    budget: Option<String>,
    brand_guidelines: Option<String>,
    compliance: Option<String>,
    call_to_action: Option<String>,
    industry: Option<String>,
    personal_style: Option<String>,
}

// Generates one `Option<String>` setter per free-text field.
macro_rules! text_setters {
    ($($field:ident),* $(,)?) => {
        $(
            #[must_use]
            pub fn $field(mut self, value: impl Into<String>) -> Self {
                self.$field = Some(value.into());
                self
            }
        )*
    };
}

impl WorkflowRequestBuilder {
    text_setters!(
        audience,
        content_type,
        tone,
        goals,
        budget,
        brand_guidelines,
        compliance,
        call_to_action,
        industry,
        personal_style,
    );

    /// Sets the platform by name; parsed in [`Self::build`].
    #[must_use]
    pub fn platform_name(mut self, name: impl Into<String>) -> Self {
        self.platform = Some(name.into());
        self
    }

    /// Sets the platform directly.
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform.display_name().to_string());
        self
    }

    /// Validates the collected fields and produces the request.
    ///
    /// # Errors
    ///
    /// - [`RequestError::MissingTopic`] if the topic is blank.
    /// - [`RequestError::UnknownPlatform`] if the platform name is not recognised.
    pub fn build(self) -> Result<WorkflowRequest, RequestError> {
        let topic = Topic::new(self.topic).ok_or(RequestError::MissingTopic)?;
        let platform = match non_blank(self.platform) {
            Some(name) => name.parse()?,
            None => Platform::default(),
        };

        Ok(WorkflowRequest {
            topic,
            platform,
            audience: or_default(self.audience, DEFAULT_AUDIENCE),
            content_type: or_default(self.content_type, DEFAULT_CONTENT_TYPE),
            tone: or_default(self.tone, DEFAULT_TONE),
            goals: or_default(self.goals, DEFAULT_GOALS),
            budget: or_default(self.budget, DEFAULT_BUDGET),
            brand_guidelines: or_default(self.brand_guidelines, DEFAULT_BRAND_GUIDELINES),
            compliance: or_default(self.compliance, DEFAULT_COMPLIANCE),
            call_to_action: or_default(self.call_to_action, DEFAULT_CALL_TO_ACTION),
            industry: non_blank(self.industry),
            personal_style: non_blank(self.personal_style),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn or_default(value: Option<String>, default: &str) -> String {
    non_blank(value).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_take_documented_defaults() {
        let req = WorkflowRequest::builder("sustainable fashion trends")
            .build()
            .unwrap();

        assert_eq!(req.topic().as_str(), "sustainable fashion trends");
        assert_eq!(req.platform(), Platform::Instagram);
        assert_eq!(req.audience(), DEFAULT_AUDIENCE);
        assert_eq!(req.content_type(), DEFAULT_CONTENT_TYPE);
        assert_eq!(req.tone(), DEFAULT_TONE);
        assert_eq!(req.goals(), DEFAULT_GOALS);
        assert_eq!(req.budget(), DEFAULT_BUDGET);
        assert_eq!(req.brand_guidelines(), DEFAULT_BRAND_GUIDELINES);
        assert_eq!(req.compliance(), DEFAULT_COMPLIANCE);
        assert_eq!(req.call_to_action(), DEFAULT_CALL_TO_ACTION);
        assert_eq!(req.industry(), None);
        assert_eq!(req.industry_or_default(), DEFAULT_INDUSTRY);
    }

    #[test]
    fn blank_fields_are_treated_as_absent() {
        let req = WorkflowRequest::builder("topic")
            .tone("   ")
            .industry("")
            .platform_name(" ")
            .build()
            .unwrap();

        assert_eq!(req.tone(), DEFAULT_TONE);
        assert_eq!(req.industry(), None);
        assert_eq!(req.platform(), Platform::Instagram);
    }

    #[test]
    fn supplied_fields_are_kept() {
        let req = WorkflowRequest::builder("AI in healthcare")
            .platform_name("linkedin")
            .audience("hospital CTOs")
            .industry("healthcare")
            .call_to_action("book a demo")
            .build()
            .unwrap();

        assert_eq!(req.platform(), Platform::LinkedIn);
        assert_eq!(req.audience(), "hospital CTOs");
        assert_eq!(req.industry(), Some("healthcare"));
        assert_eq!(req.call_to_action(), "book a demo");
    }

    #[test]
    fn personal_style_is_optional_and_trimmed() {
        let plain = WorkflowRequest::builder("topic").build().unwrap();
        assert_eq!(plain.personal_style(), None);

        let styled = WorkflowRequest::builder("topic")
            .personal_style("  Short sentences. No emoji.\n")
            .build()
            .unwrap();
        assert_eq!(styled.personal_style(), Some("Short sentences. No emoji."));
    }

    #[test]
    fn missing_topic_is_a_validation_error() {
        assert_eq!(
            WorkflowRequest::builder("  ").build(),
            Err(RequestError::MissingTopic)
        );
    }

    #[test]
    fn unknown_platform_is_a_validation_error() {
        let err = WorkflowRequest::builder("topic")
            .platform_name("friendster")
            .build()
            .unwrap_err();
        assert!(matches!(err, RequestError::UnknownPlatform { .. }));
    }
}
