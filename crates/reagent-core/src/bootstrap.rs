//! Wiring from [`Config`] to providers, indexes, tools and agents.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reagent_index::document::SplitterConfig;
use reagent_index::{CollectionSpec, IndexBuilder, QueryEngine, SharedEmbedFn, VectorIndex};
use reagent_llm::ollama::OllamaProvider;
use reagent_llm::{AnyProvider, EmbedFn, LlmProvider};
use reagent_tools::{
    QueryEngineTool, Tool, ToolRegistry, ToolSet, arithmetic_tools, query_tool_definition,
};

use crate::agent::Agent;
use crate::config::Config;

/// Ollama client for chat, bounded by the LLM timeout.
#[must_use]
pub fn ollama_provider(config: &Config) -> OllamaProvider {
    ollama(config).with_timeout(Duration::from_secs(config.timeouts.llm_seconds))
}

#[must_use]
pub fn create_provider(config: &Config) -> AnyProvider {
    AnyProvider::Ollama(ollama_provider(config))
}

/// Embedding function bounded by the embedding timeout.
#[must_use]
pub fn create_embed_fn(config: &Config) -> EmbedFn {
    let provider =
        ollama(config).with_timeout(Duration::from_secs(config.timeouts.embedding_seconds));
    AnyProvider::Ollama(provider).embed_fn()
}

fn ollama(config: &Config) -> OllamaProvider {
    OllamaProvider::new(
        &config.llm.base_url,
        config.llm.model.clone(),
        config.llm.embedding_model.clone(),
    )
}

#[must_use]
pub fn index_builder(config: &Config, embed_fn: EmbedFn) -> IndexBuilder {
    IndexBuilder::new(embed_fn, config.llm.embedding_model.clone())
        .with_splitter(SplitterConfig {
            chunk_size: config.index.chunk_size,
            chunk_overlap: config.index.chunk_overlap,
            sentence_aware: config.index.sentence_aware,
        })
        .with_max_file_size(config.index.max_file_size)
}

#[must_use]
pub fn collection_specs(config: &Config) -> Vec<CollectionSpec> {
    config
        .collections
        .iter()
        .map(|c| CollectionSpec::new(c.name.clone(), c.persist_dir.clone(), c.sources.clone()))
        .collect()
}

/// One query engine per configured collection, keyed by collection name.
///
/// # Errors
///
/// Returns an error if a configured collection has no index.
pub fn query_engines<P: LlmProvider + Clone>(
    config: &Config,
    mut indexes: BTreeMap<String, VectorIndex>,
    provider: &P,
    embed_fn: &SharedEmbedFn,
) -> anyhow::Result<BTreeMap<String, Arc<QueryEngine<P>>>> {
    let mut engines = BTreeMap::new();
    for collection in &config.collections {
        let index = indexes
            .remove(&collection.name)
            .with_context(|| format!("no index for collection {}", collection.name))?;
        let engine = QueryEngine::new(Arc::new(index), provider.clone(), Arc::clone(embed_fn))
            .with_top_k(config.index.top_k);
        engines.insert(collection.name.clone(), Arc::new(engine));
    }
    Ok(engines)
}

/// Wrap every engine as a tool named after its collection's `tool_name`.
///
/// # Errors
///
/// Returns an error if an engine is missing or two tools share a name.
pub fn query_engine_tools<P: LlmProvider + 'static>(
    config: &Config,
    engines: &BTreeMap<String, Arc<QueryEngine<P>>>,
) -> anyhow::Result<ToolSet> {
    let mut tools: Vec<Box<dyn Tool>> = Vec::with_capacity(config.collections.len());
    for collection in &config.collections {
        let engine = engines
            .get(&collection.name)
            .with_context(|| format!("no query engine for collection {}", collection.name))?;
        tools.push(Box::new(QueryEngineTool::new(
            Arc::clone(engine),
            collection.tool_name(),
            collection.description(),
        )));
    }
    Ok(ToolSet::new(tools)?)
}

/// Registry of the query tools `config` describes, without building any index.
#[must_use]
pub fn query_tool_registry(config: &Config) -> ToolRegistry {
    ToolRegistry::from_definitions(
        config
            .collections
            .iter()
            .map(|c| query_tool_definition(&c.tool_name(), &c.description()))
            .collect(),
    )
}

/// # Errors
///
/// Returns an error if the arithmetic tools cannot be registered together.
pub fn math_tools() -> anyhow::Result<ToolSet> {
    let tools = arithmetic_tools()
        .into_iter()
        .map(|t| Box::new(t) as Box<dyn Tool>)
        .collect();
    Ok(ToolSet::new(tools)?)
}

#[must_use]
pub fn build_agent<P: LlmProvider>(config: &Config, provider: P, tools: ToolSet) -> Agent<P> {
    Agent::new(provider, tools)
        .with_max_iterations(config.agent.max_iterations)
        .with_verbose(config.agent.verbose)
        .with_llm_timeout(Duration::from_secs(config.timeouts.llm_seconds))
}
