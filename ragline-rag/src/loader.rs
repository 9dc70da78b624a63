//! Document loaders that turn files into [`Document`]s.
//!
//! - [`TextFileLoader`]: one document per UTF-8 text file
//! - `PdfLoader`: one document per PDF page (requires the `pdf` feature)
//!
//! [`load_path`] picks a loader from the file extension.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::document::Document;
use crate::error::{RagError, Result};

/// Reads a source file into documents.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Load every document contained in the file at `path`.
    async fn load(&self, path: &Path) -> Result<Vec<Document>>;
}

fn loader_error(path: &Path, message: impl std::fmt::Display) -> RagError {
    RagError::LoaderError { source_id: path.display().to_string(), message: message.to_string() }
}

fn stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| loader_error(path, "path has no file name"))
}

/// Loads a UTF-8 text file (`.txt`, `.md`, ...) as a single document.
///
/// The document ID is the file stem and `source_uri` is the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFileLoader;

#[async_trait]
impl Loader for TextFileLoader {
    async fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let bytes = tokio::fs::read(path).await.map_err(|e| loader_error(path, e))?;
        let text = String::from_utf8(bytes).map_err(|e| loader_error(path, e))?;
        debug!(path = %path.display(), chars = text.chars().count(), "loaded text file");
        Ok(vec![Document::new(stem(path)?, text).with_source(path.display().to_string())])
    }
}

/// Loads a PDF as one document per page.
///
/// Page texts are separated at form-feed characters in the extracted text;
/// blank pages are skipped. Document IDs are `{stem}_p{page}` (1-based) and
/// each document carries a `page` metadata entry.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

#[cfg(feature = "pdf")]
#[async_trait]
impl Loader for PdfLoader {
    async fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let bytes = tokio::fs::read(path).await.map_err(|e| loader_error(path, e))?;
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| loader_error(path, e))?
            .map_err(|e| loader_error(path, format!("PDF extraction failed: {e}")))?;

        let stem = stem(path)?;
        let source = path.display().to_string();
        let documents: Vec<Document> = text
            .split('\u{c}')
            .enumerate()
            .filter(|(_, page)| !page.trim().is_empty())
            .map(|(i, page)| {
                let page_number = i + 1;
                Document::new(format!("{stem}_p{page_number}"), page)
                    .with_source(source.clone())
                    .with_metadata("page", page_number.to_string())
            })
            .collect();

        debug!(path = %path.display(), pages = documents.len(), "loaded pdf");
        Ok(documents)
    }
}

/// Load `path` with the loader matching its extension.
///
/// `.pdf` files use `PdfLoader`; everything else is read as text.
///
/// # Errors
///
/// Returns [`RagError::LoaderError`] if the file cannot be read or decoded,
/// or if it is a PDF and the `pdf` feature is disabled.
pub async fn load_path(path: impl AsRef<Path>) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let is_pdf =
        path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        #[cfg(feature = "pdf")]
        return PdfLoader.load(path).await;
        #[cfg(not(feature = "pdf"))]
        return Err(loader_error(path, "PDF support requires the `pdf` feature"));
    }
    TextFileLoader.load(path).await
}
