//! Reading `.txt` and `.pdf` files.

use super::SourceDocument;
use crate::error::{ItineraError, Result};
use regex::Regex;
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Page separator emitted by `pdf-extract`.
const FORM_FEED: char = '\x0c';

/// Loads files into source documents.
pub struct DocumentLoader {
    trailing_space: Regex,
    blank_runs: Regex,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self {
            trailing_space: Regex::new(r"[ \t]+\n").expect("Invalid regex"),
            blank_runs: Regex::new(r"\n{3,}").expect("Invalid regex"),
        }
    }

    /// Whether `path` has an extension this loader understands.
    pub fn is_supported(path: &Path) -> bool {
        matches!(extension(path).as_deref(), Some("txt") | Some("pdf"))
    }

    /// Load a file. Text files yield one document, PDFs one per page.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> Result<Vec<SourceDocument>> {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        match extension(path).as_deref() {
            Some("txt") => {
                let bytes = std::fs::read(path)?;
                Ok(vec![SourceDocument {
                    content: String::from_utf8_lossy(&bytes).to_string(),
                    source,
                    page: None,
                }])
            }
            Some("pdf") => {
                let text = pdf_extract::extract_text(path).map_err(|e| {
                    ItineraError::Document(format!("Failed to extract text from {}: {}", source, e))
                })?;
                let pages = self.split_pages(&text, &source);
                debug!("Extracted {} pages", pages.len());
                Ok(pages)
            }
            _ => Err(ItineraError::InvalidInput(format!(
                "Unsupported file type: {} (expected .txt or .pdf)",
                source
            ))),
        }
    }

    /// Split extracted PDF text into per-page documents.
    fn split_pages(&self, text: &str, source: &str) -> Vec<SourceDocument> {
        let text = text.strip_suffix(FORM_FEED).unwrap_or(text);
        text.split(FORM_FEED)
            .enumerate()
            .map(|(i, page)| {
                let content = self.clean(page);
                if content.is_empty() {
                    warn!("Page {} of {} has no extractable text", i + 1, source);
                }
                SourceDocument {
                    content,
                    source: source.to_string(),
                    page: Some(i as u32 + 1),
                }
            })
            .collect()
    }

    fn clean(&self, page: &str) -> String {
        let text = self.trailing_space.replace_all(page, "\n");
        let text = self.blank_runs.replace_all(&text, "\n\n");
        text.trim().to_string()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}
