//! Persisted vector indexes over document collections.
//!
//! [`acquire`] is the entry point: it loads every collection's index from disk
//! and falls back to rebuilding all of them from source documents when any
//! single load misses.

pub mod acquire;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
mod storage;

pub use acquire::{AcquireError, AcquireOutcome, AcquiredIndexes, CollectionSpec, acquire};
pub use error::{IndexError, LoadError};
pub use index::{IndexBuilder, Node, ScoredNode, SharedEmbedFn, VectorIndex};
pub use query::{QueryEngine, QueryError, QueryResponse};
