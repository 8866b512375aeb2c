use std::path::Path;

use super::super::{DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, LoadFuture};
use super::{extension_of, open_checked};

/// Plain text and Markdown files, read whole.
pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> LoadFuture<'_> {
        let path = path.to_path_buf();
        Box::pin(async move {
            let path = open_checked(&path, self.max_file_size).await?;
            let content_type = if matches!(extension_of(&path).as_str(), "md" | "markdown") {
                "text/markdown"
            } else {
                "text/plain"
            };
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| DocumentError::io(&path, e))?;

            Ok(vec![Document::new(content, path.display().to_string(), content_type)])
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }
}
