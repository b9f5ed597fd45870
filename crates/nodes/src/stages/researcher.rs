use async_trait::async_trait;
use pipeline::{ResearchInput, ResearchInsight, Stage, StageError, StageKind};

use super::ModelCall;
use crate::extract::{list_items, Sections};
use crate::prompts;

const SUMMARY: &[&str] = &["trend", "summary", "insight"];
const AUDIENCE: &[&str] = &["audience"];
const DATA: &[&str] = &["data point", "statistic", "data"];

/// Produces the run's [`ResearchInsight`]. Invoked once per run.
#[derive(Debug, Clone)]
pub struct Researcher {
    call: ModelCall,
}

impl Researcher {
    pub fn new(call: ModelCall) -> Self {
        Self { call }
    }
}

#[async_trait]
impl Stage for Researcher {
    type Input = ResearchInput;
    type Output = ResearchInsight;

    fn kind(&self) -> StageKind {
        StageKind::Researcher
    }

    async fn execute(&self, input: ResearchInput) -> Result<ResearchInsight, StageError> {
        let prompt = prompts::researcher(&input);
        let text = self.call.complete(self.kind(), &prompt).await?;
        Ok(parse(&text))
    }
}

pub(crate) fn parse(text: &str) -> ResearchInsight {
    let labels = [SUMMARY, AUDIENCE, DATA].concat();
    let sections = Sections::parse(text, &labels);

    ResearchInsight {
        trend_summary: sections
            .find(SUMMARY)
            .unwrap_or_else(|| text.trim())
            .to_string(),
        audience_recommendations: sections.find(AUDIENCE).map(str::to_string),
        data_points: sections.find(DATA).map(list_items).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pipeline::{WorkflowContext, WorkflowRequest};

    use super::*;
    use crate::stages::test_support::{call, ScriptedModel};

    #[test]
    fn labelled_response_fills_every_field() {
        let text = "## Trend Summary\nResale is booming.\n\n## Audience Recommendations\nSpeak to values.\n\n## Data Points\n- 62% of Gen Z buy used\n- Resale market doubled";
        let insight = parse(text);

        assert_eq!(insight.trend_summary, "Resale is booming.");
        assert_eq!(insight.audience_recommendations.as_deref(), Some("Speak to values."));
        assert_eq!(
            insight.data_points,
            vec!["62% of Gen Z buy used", "Resale market doubled"]
        );
    }

    #[test]
    fn unlabelled_response_becomes_the_summary() {
        let insight = parse("  Resale is booming among students.  ");
        assert_eq!(insight.trend_summary, "Resale is booming among students.");
        assert!(insight.audience_recommendations.is_none());
        assert!(insight.data_points.is_empty());
    }

    #[tokio::test]
    async fn execute_sends_the_topic_to_the_model() {
        let model = Arc::new(ScriptedModel::replying(["Trend Summary: thrift hauls"]));
        let stage = Researcher::new(call(model.clone()));
        let request = WorkflowRequest::builder("sustainable fashion").build().unwrap();
        let ctx = WorkflowContext::new(request, 2);

        let insight = stage.execute(ctx.for_researcher()).await.unwrap();
        assert_eq!(insight.trend_summary, "thrift hauls");
        assert!(model.prompts()[0].contains("sustainable fashion"));
    }
}
