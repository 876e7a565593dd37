//! PDF loading into page-level documents

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::PageDocument;

/// Produces the ordered page documents the splitter consumes
pub trait DocumentLoader: Send + Sync {
    /// Load every page, in page order
    fn load(&self) -> Result<Vec<PageDocument>>;

    /// Path of the underlying source, for staleness checks
    fn source_path(&self) -> Option<&Path> {
        None
    }
}

/// Whole-document text extractor used when lopdf finds no text
pub type FallbackExtractor = fn(&[u8]) -> std::result::Result<String, String>;

/// How long the fallback extractor may run before the PDF is rejected
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

/// Loads a PDF file, one document per page
#[derive(Debug, Clone)]
pub struct PdfLoader {
    path: PathBuf,
    fallback: FallbackExtractor,
}

impl PdfLoader {
    /// Create a loader for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fallback: pdf_extract_text,
        }
    }

    /// Replace the extractor used when lopdf yields no text
    pub fn with_fallback(mut self, fallback: FallbackExtractor) -> Self {
        self.fallback = fallback;
        self
    }

    fn display_name(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    /// Parse PDF bytes into pages
    pub fn parse(&self, data: &[u8]) -> Result<Vec<PageDocument>> {
        let name = self.display_name();
        let content_hash = hash_bytes(data);

        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(&name, format!("Failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for (page_number, _) in doc.get_pages() {
            let text = match doc.extract_text(&[page_number]) {
                Ok(text) => cleanup_pdf_text(&text),
                Err(e) => {
                    tracing::debug!("Could not extract text from page {}: {}", page_number, e);
                    String::new()
                }
            };
            pages.push(PageDocument::new(
                text,
                &name,
                page_number.saturating_sub(1),
                &content_hash,
            ));
        }

        if pages.iter().all(|p| p.content.trim().is_empty()) {
            tracing::warn!("lopdf produced no text for {}, trying pdf-extract", name);
            let text = extract_guarded(self.fallback, data)
                .map(|t| cleanup_pdf_text(&t))
                .map_err(|e| Error::file_parse(&name, e))?;

            if text.trim().is_empty() {
                return Err(Error::file_parse(
                    &name,
                    "PDF has no extractable text (image-based or encrypted)",
                ));
            }
            return Ok(vec![PageDocument::new(text, &name, 0, content_hash)]);
        }

        tracing::debug!("Loaded {} pages from {}", pages.len(), name);
        Ok(pages)
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self) -> Result<Vec<PageDocument>> {
        let data = std::fs::read(&self.path)
            .map_err(|e| Error::file_parse(self.display_name(), format!("Failed to read: {}", e)))?;
        self.parse(&data)
    }

    fn source_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

fn pdf_extract_text(data: &[u8]) -> std::result::Result<String, String> {
    pdf_extract::extract_text_from_mem(data).map_err(|e| format!("Failed to extract text: {}", e))
}

/// Run `extract` on its own thread so a panic or a hang on unusual fonts
/// becomes an error instead of taking the process down
fn extract_guarded(
    extract: FallbackExtractor,
    data: &[u8],
) -> std::result::Result<String, String> {
    let data = data.to_vec();
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let _ = tx.send(extract(&data));
    });

    match rx.recv_timeout(FALLBACK_TIMEOUT) {
        Ok(result) => {
            let _ = handle.join();
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::error!("pdf-extract timed out after {:?}", FALLBACK_TIMEOUT);
            Err(format!("pdf-extract timed out after {:?}", FALLBACK_TIMEOUT))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let _ = handle.join();
            tracing::error!("pdf-extract thread crashed");
            Err("pdf-extract panicked".to_string())
        }
    }
}

/// SHA-256 of a byte slice, hex encoded
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash a file on disk; `None` when it cannot be read
pub fn hash_file(path: &Path) -> Option<String> {
    std::fs::read(path).ok().map(|data| hash_bytes(&data))
}

/// Normalise typographic characters PDF fonts tend to emit and drop NULs
fn cleanup_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\0' => {}
            '\u{2010}' | '\u{2011}' | '\u{2013}' => out.push('-'),
            '\u{2014}' => out.push_str("--"),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2022}' => out.push_str("* "),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' => out.push(' '),
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            _ => out.push(c),
        }
    }
    out
}
