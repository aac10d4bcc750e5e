//! Ensemble binary entry point
//!
//! Reads provider credentials from the environment, fans the prompt out to
//! every configured provider, and prints the ranked results.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ensemble::{Orchestrator, OrchestratorConfig};

#[derive(Parser)]
#[command(name = "ensemble")]
#[command(about = "Query multiple LLM providers in parallel and pick the best answer")]
struct Args {
    /// The prompt to send to every provider
    prompt: String,

    /// Optional retrieved context to ground the answer in
    #[arg(long)]
    context: Option<String>,

    /// Optional system prompt
    #[arg(long)]
    system: Option<String>,

    /// Selection strategy: best_quality, fastest, or consensus
    #[arg(long)]
    strategy: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut config = OrchestratorConfig::from_env().context("failed to load configuration")?;
    if let Some(strategy) = args.strategy {
        config.strategy = strategy.parse().context("invalid selection strategy")?;
    }

    let orchestrator = Orchestrator::new(config);

    let result = orchestrator
        .generate(&args.prompt, args.context.as_deref(), args.system.as_deref())
        .await;
    orchestrator.close().await;
    let result = result?;

    println!(
        "selected: {} ({:.2}s total, strategy {})",
        result
            .selected_provider
            .map(|p| p.as_str())
            .unwrap_or("none"),
        result.total_latency,
        result.strategy_used,
    );
    for evaluation in &result.evaluations {
        println!(
            "  {:<8} {:>6.2}  {}",
            evaluation.provider, evaluation.total_score, evaluation.recommendation
        );
    }
    println!("\n{}", result.selected_text);

    Ok(())
}
