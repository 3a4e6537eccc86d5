use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const PDF_MAGIC: &[u8] = b"%PDF-";
const PAGE_SEPARATOR: &str = "\n\n";

/// Errors raised while turning a PDF into a [`Document`].
#[derive(Debug, thiserror::Error)]
pub enum DocumentReadError {
    #[error("Error reading PDF: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error reading PDF: file is not a PDF")]
    NotPdf,
    #[error("Error reading PDF: {0}")]
    Parse(String),
    #[error("Error reading PDF: document has no readable pages")]
    NoPages,
}

/// Anything that can split PDF bytes into per-page text, in page order.
pub trait PageSource: Send + Sync {
    fn pages(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentReadError>;
}

/// Page extraction backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtract;

impl PageSource for PdfExtract {
    fn pages(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentReadError> {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| DocumentReadError::Parse(e.to_string()))
    }
}

/// Extracted text of one uploaded PDF plus its display filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    filename: String,
    full_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentInfo {
    pub filename: String,
    pub content_length: usize,
    pub char_count: usize,
}

impl Document {
    pub fn new(filename: impl Into<String>, full_text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            full_text: full_text.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn info(&self) -> DocumentInfo {
        DocumentInfo {
            filename: self.filename.clone(),
            content_length: self.full_text.len(),
            char_count: self.full_text.chars().count(),
        }
    }
}

/// Load a PDF from disk with the default extractor.
pub fn load_document(path: &Path) -> Result<Document, DocumentReadError> {
    let bytes = fs::read(path)?;
    let name = path.to_string_lossy();
    load_document_with(&PdfExtract, &name, &bytes)
}

/// Load an uploaded PDF with the default extractor.
pub fn load_document_from_bytes(filename: &str, bytes: &[u8]) -> Result<Document, DocumentReadError> {
    load_document_with(&PdfExtract, filename, bytes)
}

pub fn load_document_with<S: PageSource + ?Sized>(
    source: &S,
    filename: &str,
    bytes: &[u8],
) -> Result<Document, DocumentReadError> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(DocumentReadError::NotPdf);
    }
    let pages = source.pages(bytes)?;
    if pages.is_empty() {
        return Err(DocumentReadError::NoPages);
    }

    let full_text = join_pages(&pages);
    let filename = display_filename(filename);
    if full_text.is_empty() {
        tracing::warn!(%filename, pages = pages.len(), "PDF has pages but no extractable text");
    }
    tracing::debug!(%filename, pages = pages.len(), chars = full_text.len(), "document loaded");

    Ok(Document::new(filename, full_text))
}

/// Join page texts in order with one blank line between pages.
///
/// Each page is trimmed and blank pages are skipped, so the separator is
/// always exactly one blank line and the result has no outer whitespace.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

/// Last path component, accepting both `/` and `\` separators.
pub fn display_filename(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if name.is_empty() {
        "document.pdf".to_string()
    } else {
        name.to_string()
    }
}
