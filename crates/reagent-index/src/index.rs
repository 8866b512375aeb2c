use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reagent_llm::{EmbedFn, EmbedFuture};

use crate::document::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, SplitterConfig, TextSplitter, load_documents,
};
use crate::error::IndexError;

pub type SharedEmbedFn = Arc<dyn Fn(&str) -> EmbedFuture + Send + Sync>;

/// One embedded fragment of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub text: String,
    pub source: String,
    pub content_type: String,
    pub chunk_index: usize,
}

impl Node {
    /// Ids are derived from content so a rebuild over unchanged sources reproduces them.
    #[must_use]
    pub fn derive_id(collection: &str, source: &str, chunk_index: usize, text: &str) -> String {
        let key = format!("{collection}\u{0}{source}\u{0}{chunk_index}\u{0}{text}");
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ScoredNode {
    pub node: Node,
    pub score: f32,
}

/// In-memory similarity index over one collection.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    pub(crate) collection: String,
    pub(crate) embedding_model: String,
    pub(crate) dimension: usize,
    pub(crate) nodes: Vec<Node>,
    pub(crate) embeddings: Vec<Vec<f32>>,
}

impl VectorIndex {
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Return the `top_k` nodes most similar to `query`, best first.
    /// Equal scores keep build order.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::DimensionMismatch` if `query` has the wrong length for a
    /// non-empty index.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredNode>, IndexError> {
        if self.nodes.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredNode {
                node: self.nodes[i].clone(),
                score,
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Everything needed to turn source files into a [`VectorIndex`]: the embedding
/// function, the model name recorded with the index, and the splitter.
pub struct IndexBuilder {
    embed_fn: SharedEmbedFn,
    embedding_model: String,
    splitter: TextSplitter,
    max_file_size: u64,
}

impl std::fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("embedding_model", &self.embedding_model)
            .field("splitter", &self.splitter)
            .field("max_file_size", &self.max_file_size)
            .finish_non_exhaustive()
    }
}

impl IndexBuilder {
    #[must_use]
    pub fn new(embed_fn: EmbedFn, embedding_model: impl Into<String>) -> Self {
        Self {
            embed_fn: Arc::from(embed_fn),
            embedding_model: embedding_model.into(),
            splitter: TextSplitter::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    #[must_use]
    pub fn with_splitter(mut self, config: SplitterConfig) -> Self {
        self.splitter = TextSplitter::new(config);
        self
    }

    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    #[must_use]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// The same embedding function used for building, for query-time use.
    #[must_use]
    pub fn embed_fn(&self) -> SharedEmbedFn {
        Arc::clone(&self.embed_fn)
    }

    /// # Errors
    ///
    /// Returns the first document loading error.
    pub async fn load_sources(&self, paths: &[PathBuf]) -> Result<Vec<Document>, DocumentError> {
        load_documents(paths, self.max_file_size).await
    }

    /// Split and embed `documents` into a fresh index for `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails or the embedder yields inconsistent vectors.
    pub async fn build(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> Result<VectorIndex, IndexError> {
        let mut nodes = Vec::new();
        let mut embeddings = Vec::new();
        let mut dimension = 0;

        for document in documents {
            for chunk in self.splitter.split(document) {
                let vector = (self.embed_fn)(&chunk.content).await?;
                if vector.is_empty() {
                    return Err(IndexError::EmptyEmbedding {
                        source_path: chunk.metadata.source.clone(),
                        chunk_index: chunk.chunk_index,
                    });
                }
                if !vector.iter().copied().all(f32::is_finite) {
                    return Err(IndexError::NonFiniteEmbedding {
                        source_path: chunk.metadata.source.clone(),
                        chunk_index: chunk.chunk_index,
                    });
                }
                if dimension == 0 {
                    dimension = vector.len();
                } else if vector.len() != dimension {
                    return Err(IndexError::DimensionMismatch {
                        expected: dimension,
                        actual: vector.len(),
                    });
                }

                nodes.push(Node {
                    id: Node::derive_id(
                        collection,
                        &chunk.metadata.source,
                        chunk.chunk_index,
                        &chunk.content,
                    ),
                    source: chunk.metadata.source,
                    content_type: chunk.metadata.content_type,
                    chunk_index: chunk.chunk_index,
                    text: chunk.content,
                });
                embeddings.push(vector);
            }
        }

        tracing::debug!(collection, nodes = nodes.len(), dimension, "index built");

        Ok(VectorIndex {
            collection: collection.to_owned(),
            embedding_model: self.embedding_model.clone(),
            dimension,
            nodes,
            embeddings,
        })
    }
}
