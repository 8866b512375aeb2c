pub mod error;
pub mod loader;
pub mod splitter;
pub mod types;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

pub use error::DocumentError;
pub use loader::{TextLoader, load_documents};
pub use splitter::{SplitterConfig, TextSplitter};
pub use types::{Chunk, Document, DocumentMetadata};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub type LoadFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Document>, DocumentError>> + Send + 'a>>;

pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> LoadFuture<'_>;

    fn supported_extensions(&self) -> &[&str];
}
