use std::fmt::Write;
use std::sync::Arc;

use reagent_llm::{LlmError, LlmProvider, Message};

use crate::error::IndexError;
use crate::index::{ScoredNode, SharedEmbedFn, VectorIndex};

pub const DEFAULT_TOP_K: usize = 3;

const EMPTY_CONTEXT: &str = "(no relevant context found)";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("failed to embed query: {0}")]
    Embedding(LlmError),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] IndexError),

    #[error("generation failed: {0}")]
    Generation(LlmError),
}

#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<ScoredNode>,
}

/// Retrieval-augmented answering over one index.
pub struct QueryEngine<P> {
    index: Arc<VectorIndex>,
    provider: P,
    embed_fn: SharedEmbedFn,
    top_k: usize,
}

impl<P: std::fmt::Debug> std::fmt::Debug for QueryEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("collection", &self.index.collection())
            .field("provider", &self.provider)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> QueryEngine<P> {
    #[must_use]
    pub fn new(index: Arc<VectorIndex>, provider: P, embed_fn: SharedEmbedFn) -> Self {
        Self {
            index,
            provider,
            embed_fn,
            top_k: DEFAULT_TOP_K,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Fetch the `top_k` nodes closest to `question`.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the question or searching the index fails.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ScoredNode>, QueryError> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let vector = (self.embed_fn)(question)
            .await
            .map_err(QueryError::Embedding)?;
        Ok(self.index.search(&vector, self.top_k)?)
    }

    /// Answer `question` from retrieved context.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval or generation fails.
    pub async fn query(&self, question: &str) -> Result<QueryResponse, QueryError> {
        let sources = self.retrieve(question).await?;
        tracing::debug!(
            collection = %self.index.collection(),
            retrieved = sources.len(),
            "context retrieved"
        );

        let prompt = render_qa_prompt(&sources, question);
        let answer = self
            .provider
            .chat(&[Message::user(prompt)])
            .await
            .map_err(QueryError::Generation)?;

        Ok(QueryResponse {
            answer: answer.trim().to_owned(),
            sources,
        })
    }
}

#[must_use]
pub fn render_qa_prompt(sources: &[ScoredNode], question: &str) -> String {
    let mut context = String::new();
    for (i, hit) in sources.iter().enumerate() {
        if i > 0 {
            context.push_str("\n\n");
        }
        let _ = write!(context, "source: {}\n\n{}", hit.node.source, hit.node.text.trim());
    }
    if context.is_empty() {
        context.push_str(EMPTY_CONTEXT);
    }

    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {question}\n\
         Answer: "
    )
}
