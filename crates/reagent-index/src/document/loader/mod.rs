#[cfg(feature = "pdf")]
mod pdf;
mod text;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
pub use text::TextLoader;

use super::{Document, DocumentError, DocumentLoader};

/// Resolve `path` and make sure the file fits within `max_file_size`.
async fn open_checked(path: &Path, max_file_size: u64) -> Result<PathBuf, DocumentError> {
    let resolved = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| DocumentError::io(path, e))?;
    let len = tokio::fs::metadata(&resolved)
        .await
        .map_err(|e| DocumentError::io(&resolved, e))?
        .len();
    if len > max_file_size {
        return Err(DocumentError::FileTooLarge(len));
    }
    Ok(resolved)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Pick a loader by file extension.
///
/// # Errors
///
/// Returns `DocumentError::UnsupportedFormat` when no loader handles the extension.
pub fn loader_for(
    path: &Path,
    max_file_size: u64,
) -> Result<Box<dyn DocumentLoader>, DocumentError> {
    let ext = extension_of(path);
    let text = TextLoader { max_file_size };
    if text.supported_extensions().contains(&ext.as_str()) {
        return Ok(Box::new(text));
    }
    #[cfg(feature = "pdf")]
    {
        let pdf = PdfLoader { max_file_size };
        if pdf.supported_extensions().contains(&ext.as_str()) {
            return Ok(Box::new(pdf));
        }
    }
    Err(DocumentError::UnsupportedFormat(path.display().to_string()))
}

/// Load every file in `paths`, in order, into one document list.
///
/// A file reached through more than one path (`a.txt`, `./a.txt`, a symlink) is
/// loaded once, at its first position.
///
/// # Errors
///
/// Returns the first loader error; no partial list is returned.
pub async fn load_documents(
    paths: &[PathBuf],
    max_file_size: u64,
) -> Result<Vec<Document>, DocumentError> {
    let mut documents = Vec::new();
    let mut seen = HashSet::new();
    for path in paths {
        let resolved = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| DocumentError::io(path, e))?;
        if !seen.insert(resolved) {
            tracing::debug!(path = %path.display(), "skipping repeated source");
            continue;
        }
        let loader = loader_for(path, max_file_size)?;
        let mut docs = loader.load(path).await?;
        tracing::debug!(path = %path.display(), count = docs.len(), "loaded documents");
        documents.append(&mut docs);
    }
    Ok(documents)
}
