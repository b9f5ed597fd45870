//! Social Agent CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Load configuration**: read `.env`, then flags and environment
//!    variables, into a validated [`pipeline::WorkflowConfig`] and a
//!    [`llm::Provider`].
//! 2. **Wire observability**: install `tracing-subscriber` with a pretty or
//!    JSON layer and, when an OTLP endpoint is configured, an OpenTelemetry
//!    exporter. All spans and events from every crate flow through it.
//! 3. **Construct infrastructure**: create the [`llm::ChatCompletionsClient`]
//!    and inject it into a [`nodes::Orchestrator`].
//! 4. **Run and report**: drive one workflow (or review one existing post),
//!    cancel it on Ctrl-C, print the summary, and optionally export the
//!    result as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use llm::ChatCompletionsClient;
use nodes::Orchestrator;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod args;
mod report;
mod settings;
mod telemetry;

use args::{Cli, Command, CreateArgs, ModelArgs, ReviewArgs, WorkflowArgs};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal; real environment variables take precedence.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let telemetry = match telemetry::init(&cli.log_level, cli.log_format) {
        Ok(t) => t,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("command failed: {err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Create(args) => create(args, &cli.model, &cli.workflow).await,
        Command::Review(args) => review(args, &cli.model, &cli.workflow).await,
        Command::Config => {
            show_config(&cli.model, &cli.workflow, &cli.log_level)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn create(
    args: CreateArgs,
    model: &ModelArgs,
    workflow: &WorkflowArgs,
) -> anyhow::Result<ExitCode> {
    let style = args.read_style_file()?;
    let request = args.to_request(style).context("invalid request")?;
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();
    let orchestrator = orchestrator(model, workflow)?.with_progress(progress_tx);

    let printer = tokio::spawn(async move {
        while let Some(transition) = progress_rx.recv().await {
            eprintln!("{}", report::progress_line(&transition));
        }
    });

    let cancel = CancellationToken::new();
    let interrupt = cancel_on_interrupt(&cancel);

    let result = orchestrator.run(request, &cancel).await;
    interrupt.abort();
    drop(orchestrator);
    let _ = printer.await;

    print!("{}", report::render(&result));
    if let Some(path) = &args.output {
        report::export(&result, path)?;
        println!("\nResult exported to {}", path.display());
    }

    Ok(ExitCode::from(report::exit_code(&result)))
}

async fn review(
    args: ReviewArgs,
    model: &ModelArgs,
    workflow: &WorkflowArgs,
) -> anyhow::Result<ExitCode> {
    let post = args.post()?;
    let request = args.to_request(&post).context("invalid review request")?;
    let orchestrator = orchestrator(model, workflow)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel_on_interrupt(&cancel);
    let verdict = orchestrator.review_post(&request, &post, &cancel).await;
    interrupt.abort();
    let verdict = verdict.context("review failed")?;

    print!("{}", report::render_verdict(&verdict));
    if let Some(path) = &args.output {
        report::export_verdict(&verdict, path)?;
        println!("\nVerdict exported to {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// An orchestrator over the configured provider.
fn orchestrator(model: &ModelArgs, workflow: &WorkflowArgs) -> anyhow::Result<Orchestrator> {
    let config = workflow.to_config()?;
    let provider = model.to_provider()?;
    info!(
        provider = provider.name(),
        deployment = %provider.deployment(),
        max_retries = config.max_retries(),
        per_stage_timeout_ms = config.per_stage_timeout().as_millis() as u64,
        "configuration loaded"
    );

    let client = ChatCompletionsClient::new(provider)?;
    Ok(Orchestrator::from_model_client(Arc::new(client), config)?)
}

fn cancel_on_interrupt(cancel: &CancellationToken) -> JoinHandle<()> {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling after the current stage");
            cancel.cancel();
        }
    })
}

fn show_config(model: &ModelArgs, workflow: &WorkflowArgs, log_level: &str) -> anyhow::Result<()> {
    let config = workflow.to_config()?;
    let options = config.model_options();

    let mut rows = model.describe();
    rows.extend([
        ("max retries", config.max_retries().to_string()),
        (
            "stage timeout",
            format!("{} ms", config.per_stage_timeout().as_millis()),
        ),
        ("max tokens", options.max_tokens.to_string()),
        ("temperature", options.temperature.to_string()),
        ("log level", log_level.to_string()),
    ]);

    for (name, value) in rows {
        println!("{name:<14} {value}");
    }
    Ok(())
}
