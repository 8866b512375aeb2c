use std::path::PathBuf;

/// Failures while building, persisting or searching an index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] reagent_llm::LlmError),

    #[error("embedding for chunk {chunk_index} of {source_path} is empty")]
    EmptyEmbedding {
        source_path: String,
        chunk_index: usize,
    },

    #[error("embedding for chunk {chunk_index} of {source_path} contains NaN or infinity")]
    NonFiniteEmbedding {
        source_path: String,
        chunk_index: usize,
    },

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reasons persisted state could not be reused. Always recoverable by a rebuild.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("persist directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("index file {0} does not exist")]
    MissingFile(PathBuf),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed index file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unsupported index format version {0}")]
    UnsupportedVersion(u32),

    #[error("index belongs to collection {found}, expected {expected}")]
    CollectionMismatch { expected: String, found: String },

    #[error("index was built with embedding model {found}, expected {expected}")]
    ModelMismatch { expected: String, found: String },

    #[error("inconsistent index state: {0}")]
    Inconsistent(String),
}
