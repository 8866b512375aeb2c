use std::path::Path;

use super::super::{DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, LoadFuture};
use super::open_checked;

pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> LoadFuture<'_> {
        let path = path.to_path_buf();
        Box::pin(async move {
            let path = open_checked(&path, self.max_file_size).await?;
            let source = path.display().to_string();
            let content = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text(&path).map_err(|e| DocumentError::Pdf(e.to_string()))
            })
            .await
            .map_err(|e| DocumentError::Pdf(format!("extraction task failed: {e}")))??;

            Ok(vec![Document::new(content, source, "application/pdf")])
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.pdf");
        std::fs::write(&file, "not a pdf").unwrap();

        let result = PdfLoader::default().load(&file).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_pdf_is_io_error() {
        let result = PdfLoader::default()
            .load(Path::new("/nonexistent/APPLE_RAG.pdf"))
            .await;
        assert!(matches!(result, Err(DocumentError::Io { .. })));
    }
}
