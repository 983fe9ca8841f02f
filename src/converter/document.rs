//! Serializable document model for the built-in text backend.
//!
//! The JSON layout follows docling's `DoclingDocument` so that clients see the
//! same shape whichever backend served the request: a `body` group whose
//! children are `$ref` pointers into a flat `texts` array.

use serde::Serialize;

use crate::error::ConvertError;

use super::DocumentModel;

/// Schema name reported in the `schema_name` field.
pub const SCHEMA_NAME: &str = "DoclingDocument";

/// Schema version reported in the `version` field.
pub const SCHEMA_VERSION: &str = "1.0.0";

const BODY_REF: &str = "#/body";

/// Semantic label of a text item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextLabel {
    SectionHeader,
    ListItem,
    Paragraph,
}

/// JSON pointer to another node of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRef {
    #[serde(rename = "$ref")]
    pub target: String,
}

impl NodeRef {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Where the document came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentOrigin {
    pub mimetype: String,

    /// Hex-encoded SHA-256 of the source bytes
    pub binary_hash: String,

    pub filename: String,
}

/// Top-level group holding the reading order.
#[derive(Debug, Clone, Serialize)]
struct BodyGroup {
    self_ref: String,
    children: Vec<NodeRef>,
    content_layer: &'static str,
    name: &'static str,
    label: &'static str,
}

/// A single block of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextItem {
    pub self_ref: String,
    pub parent: NodeRef,
    pub content_layer: &'static str,
    pub label: TextLabel,

    /// Text as it appeared in the source, including markup
    pub orig: String,

    /// Text with markup removed
    pub text: String,

    /// Heading level (section headers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,

    /// List marker such as `-` or `1.` (list items only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

/// A document made of headings, list items and paragraphs.
#[derive(Debug, Clone, Serialize)]
pub struct TextDocument {
    schema_name: &'static str,
    version: &'static str,
    name: String,
    origin: DocumentOrigin,
    body: BodyGroup,
    texts: Vec<TextItem>,
}

impl TextDocument {
    /// Create an empty document.
    pub fn new(name: impl Into<String>, origin: DocumentOrigin) -> Self {
        Self {
            schema_name: SCHEMA_NAME,
            version: SCHEMA_VERSION,
            name: name.into(),
            origin,
            body: BodyGroup {
                self_ref: BODY_REF.to_string(),
                children: Vec::new(),
                content_layer: "body",
                name: "_root_",
                label: "unspecified",
            },
            texts: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &DocumentOrigin {
        &self.origin
    }

    /// Text items in reading order.
    pub fn texts(&self) -> &[TextItem] {
        &self.texts
    }

    pub fn add_paragraph(&mut self, text: impl Into<String>, orig: impl Into<String>) {
        self.push(TextLabel::Paragraph, text.into(), orig.into(), None, None);
    }

    pub fn add_heading(&mut self, level: u8, text: impl Into<String>, orig: impl Into<String>) {
        self.push(
            TextLabel::SectionHeader,
            text.into(),
            orig.into(),
            Some(level),
            None,
        );
    }

    pub fn add_list_item(
        &mut self,
        marker: impl Into<String>,
        text: impl Into<String>,
        orig: impl Into<String>,
    ) {
        self.push(
            TextLabel::ListItem,
            text.into(),
            orig.into(),
            None,
            Some(marker.into()),
        );
    }

    fn push(
        &mut self,
        label: TextLabel,
        text: String,
        orig: String,
        level: Option<u8>,
        marker: Option<String>,
    ) {
        let self_ref = format!("#/texts/{}", self.texts.len());
        self.body.children.push(NodeRef::new(self_ref.clone()));
        self.texts.push(TextItem {
            self_ref,
            parent: NodeRef::new(BODY_REF),
            content_layer: "body",
            label,
            orig,
            text,
            level,
            marker,
        });
    }

    /// Render as Markdown, one block per item separated by blank lines.
    ///
    /// Consecutive list items are kept on adjacent lines.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let mut previous: Option<TextLabel> = None;

        for item in &self.texts {
            if let Some(prev) = previous {
                if prev == TextLabel::ListItem && item.label == TextLabel::ListItem {
                    out.push('\n');
                } else {
                    out.push_str("\n\n");
                }
            }

            match item.label {
                TextLabel::SectionHeader => {
                    let level = item.level.unwrap_or(1).clamp(1, 6) as usize;
                    out.push_str(&"#".repeat(level));
                    out.push(' ');
                    out.push_str(&item.text);
                }
                TextLabel::ListItem => {
                    out.push_str(item.marker.as_deref().unwrap_or("-"));
                    out.push(' ');
                    out.push_str(&item.text);
                }
                TextLabel::Paragraph => out.push_str(&item.text),
            }

            previous = Some(item.label);
        }

        out
    }
}

impl DocumentModel for TextDocument {
    fn export_to_markdown(&self) -> String {
        self.to_markdown()
    }

    fn export_to_json(&self) -> Result<serde_json::Value, ConvertError> {
        serde_json::to_value(self).map_err(|e| ConvertError::InvalidOutput(e.to_string()))
    }
}
