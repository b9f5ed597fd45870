//! Command-line surface.
//!
//! Every setting can also come from the environment (or a `.env` file loaded
//! before parsing); a flag always wins over its variable.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use llm::{DEFAULT_AZURE_API_VERSION, DEFAULT_DEPLOYMENT, DEFAULT_OPENAI_BASE_URL};
use pipeline::{
    RequestError, WorkflowRequest, WorkflowRequestBuilder, DEFAULT_MAX_RETRIES,
    DEFAULT_MAX_TOKENS,
};

/// Multi-stage social media content generation.
#[derive(Debug, Parser)]
#[command(name = "social-agent", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log filter directive (e.g. `info`, `debug,reqwest=warn`).
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub workflow: WorkflowArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Research, draft, optimise, and review a post.
    Create(CreateArgs),
    /// Review an existing post without drafting a new one.
    Review(ReviewArgs),
    /// Show the effective configuration.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, for terminals.
    Pretty,
    /// One JSON object per line, for log shippers.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    Azure,
    #[value(name = "openai")]
    OpenAi,
}

// ---------------------------------------------------------------------------
// Model provider settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Which chat-completions provider to call. Inferred from the configured
    /// credentials when omitted.
    #[arg(long, env = "MODEL_PROVIDER", value_enum, global = true)]
    pub provider: Option<ProviderKind>,

    #[arg(long, env = "AZURE_AI_ENDPOINT", global = true)]
    pub azure_endpoint: Option<String>,

    #[arg(long, env = "AZURE_AI_API_KEY", hide_env_values = true, global = true)]
    pub azure_api_key: Option<String>,

    #[arg(long, env = "AZURE_AI_DEPLOYMENT_NAME", default_value = DEFAULT_DEPLOYMENT, global = true)]
    pub deployment: String,

    #[arg(long, env = "AZURE_AI_API_VERSION", default_value = DEFAULT_AZURE_API_VERSION, global = true)]
    pub api_version: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_DEPLOYMENT, global = true)]
    pub openai_model: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL, global = true)]
    pub openai_base_url: String,
}

// ---------------------------------------------------------------------------
// Workflow settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Args)]
pub struct WorkflowArgs {
    /// Regenerations allowed after the first draft.
    #[arg(long, env = "MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES, global = true)]
    pub max_retries: u32,

    /// Overall time budget; each stage gets a quarter of it unless
    /// `--per-stage-timeout-ms` is set.
    #[arg(
        long = "workflow-timeout",
        env = "WORKFLOW_TIMEOUT",
        value_name = "SECONDS",
        default_value_t = 300,
        global = true
    )]
    pub workflow_timeout_secs: u64,

    #[arg(long, env = "PER_STAGE_TIMEOUT_MS", global = true)]
    pub per_stage_timeout_ms: Option<u64>,

    #[arg(long, env = "MODEL_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS, global = true)]
    pub max_tokens: u32,

    #[arg(long, env = "MODEL_TEMPERATURE", default_value_t = 0.7, global = true)]
    pub temperature: f32,
}

// ---------------------------------------------------------------------------
// `create`
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// What the post is about.
    #[arg(long, short)]
    pub topic: String,

    /// Instagram, LinkedIn, Twitter (or X), Facebook, TikTok, or YouTube.
    #[arg(long, short)]
    pub platform: Option<String>,

    #[arg(long, short)]
    pub audience: Option<String>,

    /// E.g. "carousel post", "short video script".
    #[arg(long)]
    pub content_type: Option<String>,

    #[arg(long)]
    pub tone: Option<String>,

    #[arg(long)]
    pub goals: Option<String>,

    #[arg(long)]
    pub budget: Option<String>,

    #[arg(long)]
    pub brand_guidelines: Option<String>,

    #[arg(long)]
    pub compliance: Option<String>,

    /// Call to action.
    #[arg(long)]
    pub cta: Option<String>,

    #[arg(long)]
    pub industry: Option<String>,

    /// Your own writing-style guidelines, applied to every draft.
    #[arg(long, env = "PERSONAL_STYLE")]
    pub personal_style: Option<String>,

    /// Read the writing-style guidelines from a file. Takes precedence over
    /// `--personal-style`.
    #[arg(long)]
    pub style_file: Option<PathBuf>,

    /// Write the full result as JSON to this file.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

type Setter = fn(WorkflowRequestBuilder, String) -> WorkflowRequestBuilder;

impl CreateArgs {
    /// Builds the workflow request; unset fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] for a blank topic or unknown platform.
    pub fn to_request(&self, personal_style: Option<String>) -> Result<WorkflowRequest, RequestError> {
        let personal_style = personal_style.or_else(|| self.personal_style.clone());
        let setters: [(&Option<String>, Setter); 11] = [
            (&self.platform, |b, v| b.platform_name(v)),
            (&self.audience, |b, v| b.audience(v)),
            (&self.content_type, |b, v| b.content_type(v)),
            (&self.tone, |b, v| b.tone(v)),
            (&self.goals, |b, v| b.goals(v)),
            (&self.budget, |b, v| b.budget(v)),
            (&self.brand_guidelines, |b, v| b.brand_guidelines(v)),
            (&self.compliance, |b, v| b.compliance(v)),
            (&self.cta, |b, v| b.call_to_action(v)),
            (&self.industry, |b, v| b.industry(v)),
            (&personal_style, |b, v| b.personal_style(v)),
        ];

        setters
            .into_iter()
            .fold(WorkflowRequest::builder(&self.topic), |builder, (value, set)| {
                match value {
                    Some(v) => set(builder, v.clone()),
                    None => builder,
                }
            })
            .build()
    }

    /// Contents of `--style-file`, if one was given.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read.
    pub fn read_style_file(&self) -> anyhow::Result<Option<String>> {
        self.style_file.as_deref().map(read_text).transpose()
    }
}

/// Longest topic derived from the first line of a reviewed post.
const DERIVED_TOPIC_CHARS: usize = 80;

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("post").required(true).args(["content", "file"])))]
pub struct ReviewArgs {
    /// The post text to review.
    #[arg(long, short)]
    pub content: Option<String>,

    /// Read the post text from a file.
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    /// What the post is about. Defaults to its first line.
    #[arg(long, short)]
    pub topic: Option<String>,

    #[arg(long, short)]
    pub platform: Option<String>,

    #[arg(long, short)]
    pub audience: Option<String>,

    #[arg(long)]
    pub brand_guidelines: Option<String>,

    #[arg(long)]
    pub compliance: Option<String>,

    /// Write the verdict as JSON to this file.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl ReviewArgs {
    /// The post text, from `--content` or `--file`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read.
    pub fn post(&self) -> anyhow::Result<String> {
        match (&self.content, &self.file) {
            (Some(content), _) => Ok(content.clone()),
            (None, Some(path)) => read_text(path),
            (None, None) => anyhow::bail!("either --content or --file is required"),
        }
    }

    /// Review context for `post`; unset fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] for an empty post or unknown platform.
    pub fn to_request(&self, post: &str) -> Result<WorkflowRequest, RequestError> {
        let topic = self
            .topic
            .clone()
            .unwrap_or_else(|| derived_topic(post));
        let setters: [(&Option<String>, Setter); 4] = [
            (&self.platform, |b, v| b.platform_name(v)),
            (&self.audience, |b, v| b.audience(v)),
            (&self.brand_guidelines, |b, v| b.brand_guidelines(v)),
            (&self.compliance, |b, v| b.compliance(v)),
        ];

        setters
            .into_iter()
            .fold(WorkflowRequest::builder(topic), |builder, (value, set)| {
                match value {
                    Some(v) => set(builder, v.clone()),
                    None => builder,
                }
            })
            .build()
    }
}

fn derived_topic(post: &str) -> String {
    post.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .chars()
        .take(DERIVED_TOPIC_CHARS)
        .collect()
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pipeline::Platform;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("social-agent").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_builds_a_request_with_defaults() {
        let cli = parse(&["create", "--topic", "sustainable fashion trends"]);
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };

        let request = args.to_request(None).unwrap();
        assert_eq!(request.topic().as_str(), "sustainable fashion trends");
        assert_eq!(request.platform(), Platform::Instagram);
        assert_eq!(request.audience(), pipeline::request::DEFAULT_AUDIENCE);
        assert!(args.output.is_none());
    }

    #[test]
    fn create_maps_every_flag() {
        let cli = parse(&[
            "create",
            "-t",
            "AI in healthcare",
            "-p",
            "linkedin",
            "--audience",
            "clinicians",
            "--cta",
            "Book a demo",
            "--industry",
            "healthcare",
            "--output",
            "out.json",
        ]);
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };

        let request = args.to_request(None).unwrap();
        assert_eq!(request.platform(), Platform::LinkedIn);
        assert_eq!(request.audience(), "clinicians");
        assert_eq!(request.call_to_action(), "Book a demo");
        assert_eq!(request.industry(), Some("healthcare"));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn unknown_platform_is_a_request_error() {
        let cli = parse(&["create", "--topic", "x", "--platform", "myspace"]);
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        assert!(matches!(
            args.to_request(None),
            Err(RequestError::UnknownPlatform { .. })
        ));
    }

    #[test]
    fn style_file_wins_over_inline_style() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.md");
        std::fs::write(&path, "Warm, first person, no buzzwords.\n").unwrap();

        let cli = parse(&[
            "create",
            "--topic",
            "x",
            "--personal-style",
            "formal",
            "--style-file",
            path.to_str().unwrap(),
        ]);
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };

        let style = args.read_style_file().unwrap();
        let request = args.to_request(style).unwrap();
        assert_eq!(request.personal_style(), Some("Warm, first person, no buzzwords."));
    }

    #[test]
    fn inline_style_is_used_without_a_file() {
        let cli = parse(&["create", "--topic", "x", "--personal-style", "formal"]);
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };

        assert_eq!(args.read_style_file().unwrap(), None);
        assert_eq!(args.to_request(None).unwrap().personal_style(), Some("formal"));
    }

    #[test]
    fn missing_style_file_is_reported() {
        let cli = parse(&["create", "--topic", "x", "--style-file", "/nonexistent/style.md"]);
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        let err = args.read_style_file().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/style.md"));
    }

    #[test]
    fn review_takes_inline_content_and_derives_a_topic() {
        let cli = parse(&[
            "review",
            "--content",
            "\n  Thrift first, then buy.\nWhat's your best find? #thrift",
            "-p",
            "linkedin",
        ]);
        let Command::Review(args) = cli.command else {
            panic!("expected review");
        };

        let post = args.post().unwrap();
        let request = args.to_request(&post).unwrap();
        assert_eq!(request.topic().as_str(), "Thrift first, then buy.");
        assert_eq!(request.platform(), Platform::LinkedIn);
    }

    #[test]
    fn review_reads_the_post_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.txt");
        std::fs::write(&path, "Old post text").unwrap();

        let cli = parse(&["review", "--file", path.to_str().unwrap(), "--topic", "thrifting"]);
        let Command::Review(args) = cli.command else {
            panic!("expected review");
        };

        let post = args.post().unwrap();
        assert_eq!(post, "Old post text");
        assert_eq!(args.to_request(&post).unwrap().topic().as_str(), "thrifting");
    }

    #[test]
    fn review_needs_content_or_file() {
        let err = Cli::try_parse_from(["social-agent", "review"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn create_requires_a_topic() {
        let err = Cli::try_parse_from(["social-agent", "create"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = parse(&[
            "create",
            "--topic",
            "x",
            "--max-retries",
            "4",
            "--log-format",
            "json",
            "--provider",
            "openai",
        ]);
        assert_eq!(cli.workflow.max_retries, 4);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.model.provider, Some(ProviderKind::OpenAi));
    }
}
