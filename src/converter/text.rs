//! Built-in converter for plain text and Markdown files.

use std::path::Path;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ConvertError;

use super::document::{DocumentOrigin, TextDocument};
use super::DocumentConverter;

/// File extensions accepted by [`PlainTextConverter`] (lowercase, without dot).
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Plain,
    Markdown,
}

impl Flavor {
    fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let extension = match path.extension().and_then(|e| e.to_str()) {
            None => return Ok(Flavor::Plain),
            Some(ext) => ext.to_ascii_lowercase(),
        };

        match extension.as_str() {
            "txt" | "text" => Ok(Flavor::Plain),
            "md" | "markdown" => Ok(Flavor::Markdown),
            other => Err(ConvertError::UnsupportedFormat {
                reason: format!(
                    "'.{}' is not a text format (expected one of: {})",
                    other,
                    TEXT_EXTENSIONS.join(", ")
                ),
            }),
        }
    }

    fn mimetype(self) -> &'static str {
        match self {
            Flavor::Plain => "text/plain",
            Flavor::Markdown => "text/markdown",
        }
    }
}

/// Converter for `.txt` and `.md` uploads that needs no external program.
///
/// Plain text is split into paragraphs on blank lines. Markdown additionally
/// recognizes ATX headings and list items; other markup is kept verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextConverter;

impl PlainTextConverter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentConverter for PlainTextConverter {
    type Document = TextDocument;

    fn name(&self) -> &str {
        "text"
    }

    async fn probe(&self) -> Result<String, ConvertError> {
        Ok(format!(
            "built-in text converter ({})",
            TEXT_EXTENSIONS.join(", ")
        ))
    }

    async fn convert(&self, path: &Path) -> Result<TextDocument, ConvertError> {
        let flavor = Flavor::from_path(path)?;
        let bytes = tokio::fs::read(path).await?;

        let binary_hash = hex::encode(Sha256::digest(&bytes));
        let content = String::from_utf8(bytes)
            .map_err(|e| ConvertError::InvalidDocument(format!("content is not UTF-8: {}", e)))?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let name = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let origin = DocumentOrigin {
            mimetype: flavor.mimetype().to_string(),
            binary_hash,
            filename,
        };

        let document = parse_document(name, origin, &content, flavor);
        debug!(
            items = document.texts().len(),
            mimetype = flavor.mimetype(),
            "Parsed text document"
        );

        Ok(document)
    }
}

fn parse_document(name: String, origin: DocumentOrigin, content: &str, flavor: Flavor) -> TextDocument {
    let mut document = TextDocument::new(name, origin);
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut paragraph: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut document, &mut paragraph);
            continue;
        }

        if flavor == Flavor::Markdown {
            if let Some((level, text)) = parse_heading(line) {
                flush_paragraph(&mut document, &mut paragraph);
                document.add_heading(level, text, line.trim_end());
                continue;
            }
            if let Some((marker, text)) = parse_list_item(line) {
                flush_paragraph(&mut document, &mut paragraph);
                document.add_list_item(marker, text, line.trim_end());
                continue;
            }
        }

        paragraph.push(line);
    }
    flush_paragraph(&mut document, &mut paragraph);

    document
}

fn flush_paragraph(document: &mut TextDocument, lines: &mut Vec<&str>) {
    if lines.is_empty() {
        return;
    }

    let text = lines
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join(" ");
    let orig = lines
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    document.add_paragraph(text, orig);
    lines.clear();
}

/// Parse an ATX heading (`# Title` .. `###### Title`).
fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }

    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }

    let text = rest.trim().trim_end_matches('#').trim_end();
    if text.is_empty() {
        return None;
    }
    Some((level as u8, text))
}

/// Parse a bullet (`-`, `*`, `+`) or ordered (`1.`, `1)`) list item.
fn parse_list_item(line: &str) -> Option<(String, &str)> {
    let trimmed = line.trim_start();

    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = trimmed.strip_prefix(bullet) {
            let text = rest.trim();
            return (!text.is_empty()).then(|| ("-".to_string(), text));
        }
    }

    let digits = trimmed.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let rest = &trimmed[digits..];
    let rest = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") "))?;
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some((format!("{}.", &trimmed[..digits]), text))
}
