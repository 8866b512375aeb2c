mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use reagent_core::AgentResponse;
use reagent_core::agent::prompt::prompt_templates;
use reagent_core::bootstrap;
use reagent_core::config::{Config, resolve_config_path};
use reagent_index::{AcquireOutcome, AcquiredIndexes, IndexBuilder, acquire};
use reagent_llm::{LlmProvider, Message};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), "config loaded");

    match cli.command {
        Command::Ask { question } => ask(&config, &question).await,
        Command::Index { rebuild } => index(&config, rebuild).await,
        Command::Query {
            collection,
            question,
        } => query(&config, &collection, &question).await,
        Command::Math { question } => math(&config, &question).await,
        Command::Complete { prompt } => complete(&config, &prompt).await,
        Command::Prompts => {
            print_prompts(&config);
            Ok(())
        }
    }
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

async fn health_check(config: &Config) {
    let ollama = bootstrap::ollama_provider(config);
    if let Err(e) = ollama.health_check().await {
        tracing::warn!("ollama health check failed: {e}");
        return;
    }
    match ollama.fetch_model_info().await {
        Ok(info) => tracing::info!(
            model = ollama.model(),
            context_length = ?info.context_length,
            "ollama is reachable"
        ),
        Err(e) => tracing::warn!(model = ollama.model(), "model info unavailable: {e}"),
    }
}

async fn acquire_indexes(
    config: &Config,
    rebuild: bool,
) -> anyhow::Result<(AcquiredIndexes, IndexBuilder)> {
    if config.collections.is_empty() {
        anyhow::bail!("no collections configured");
    }
    let builder = bootstrap::index_builder(config, bootstrap::create_embed_fn(config));
    let specs = bootstrap::collection_specs(config);
    let acquired = acquire(&specs, &builder, rebuild).await?;
    match &acquired.outcome {
        AcquireOutcome::Loaded => {
            tracing::info!("loaded {} persisted indexes", acquired.indexes.len());
        }
        AcquireOutcome::Rebuilt { reason } => {
            tracing::info!(%reason, "rebuilt {} indexes", acquired.indexes.len());
        }
    }
    Ok((acquired, builder))
}

async fn ask(config: &Config, question: &str) -> anyhow::Result<()> {
    let provider = bootstrap::create_provider(config);
    health_check(config).await;

    let (acquired, builder) = acquire_indexes(config, false).await?;
    let engines =
        bootstrap::query_engines(config, acquired.indexes, &provider, &builder.embed_fn())?;
    let tools = bootstrap::query_engine_tools(config, &engines)?;
    let agent = bootstrap::build_agent(config, provider, tools);

    let response = agent.chat(question).await?;
    print_response(&response);
    Ok(())
}

async fn index(config: &Config, rebuild: bool) -> anyhow::Result<()> {
    let (acquired, _) = acquire_indexes(config, rebuild).await?;
    match &acquired.outcome {
        AcquireOutcome::Loaded => println!("All indexes loaded from storage."),
        AcquireOutcome::Rebuilt { reason } => println!("Indexes rebuilt ({reason})."),
    }
    for (name, index) in &acquired.indexes {
        println!(
            "{name}: {} nodes, dimension {}, model {}",
            index.len(),
            index.dimension(),
            index.embedding_model()
        );
    }
    Ok(())
}

async fn query(config: &Config, collection: &str, question: &str) -> anyhow::Result<()> {
    if !config.collections.iter().any(|c| c.name == collection) {
        anyhow::bail!("unknown collection: {collection}");
    }
    let provider = bootstrap::create_provider(config);
    let (acquired, builder) = acquire_indexes(config, false).await?;
    let engines =
        bootstrap::query_engines(config, acquired.indexes, &provider, &builder.embed_fn())?;
    let engine = engines
        .get(collection)
        .map(Arc::clone)
        .with_context(|| format!("unknown collection: {collection}"))?;

    let response = engine.query(question).await?;
    println!("{}", response.answer);
    for hit in &response.sources {
        println!(
            "  [{:.3}] {} #{}",
            hit.score, hit.node.source, hit.node.chunk_index
        );
    }
    Ok(())
}

async fn math(config: &Config, question: &str) -> anyhow::Result<()> {
    let provider = bootstrap::create_provider(config);
    health_check(config).await;

    let agent = bootstrap::build_agent(config, provider, bootstrap::math_tools()?);
    let response = agent.chat(question).await?;
    print_response(&response);
    Ok(())
}

async fn complete(config: &Config, prompt: &str) -> anyhow::Result<()> {
    let provider = bootstrap::create_provider(config);
    let reply = provider.chat(&[Message::user(prompt)]).await?;
    println!("{}", reply.trim());
    Ok(())
}

fn print_prompts(config: &Config) {
    for (name, template) in prompt_templates(&bootstrap::query_tool_registry(config)) {
        println!("=== {name} ===\n{template}\n");
    }
}

fn print_response(response: &AgentResponse) {
    println!("{}", response.answer);
    if !response.sources.is_empty() {
        println!("\nTools used: {}", response.sources.join(", "));
    }
}
