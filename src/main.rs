//! codemend binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use codemend::agent_loop::{AgentLoop, RunEvent, RunEventPayload, RunEventSink, RunOutcome};
use codemend::cli::{errors::format_error_help, Cli};
use codemend::config::AgentConfig;
use codemend::error::AgentError;
use codemend::prompt::review_instruction;
use codemend::provider::GoogleBackend;
use codemend::tools::{register_builtin_tools, ToolRegistry};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging();

    match handle_review(cli).await {
        Ok(RunOutcome::Completed { text }) => {
            println!("\n{text}");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::MaxTurnsExceeded { max_turns }) => {
            eprintln!("Error: stopped after {max_turns} backend calls without a final summary. Raise CODEMEND_MAX_TURNS to allow more");
            ExitCode::FAILURE
        }
        Ok(RunOutcome::Canceled) => {
            eprintln!("Canceled");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", format_error_help(&e));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only the review output.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("codemend=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

async fn handle_review(cli: Cli) -> Result<RunOutcome, AgentError> {
    let config = AgentConfig::load()?;
    let backend = GoogleBackend::from_config(&config)?;

    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, &config.list_files)?;

    let sink: RunEventSink = Arc::new(|event: RunEvent| {
        if let RunEventPayload::ToolCallStarted { call } = &event.payload {
            println!("{}", call.name);
        }
    });
    let agent = AgentLoop::from_config(Arc::new(backend), Arc::new(registry), &config)
        .with_event_sink(sink);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    println!("reviewing {}\n", cli.directory.display());
    let report = agent.run(review_instruction(&cli.directory), cancel).await?;
    Ok(report.outcome)
}
