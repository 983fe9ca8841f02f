//! Converter backend driving the `docling` command-line tool.
//!
//! Each conversion runs:
//!
//! ```text
//! docling [extra args] --to md --to json --image-export-mode placeholder \
//!     --output <private dir> <source>
//! ```
//!
//! and reads back the single `.md` and `.json` file docling writes into the
//! output directory. The output directory is removed when the conversion
//! returns, whatever the outcome.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ConvertError;

use super::{DocumentConverter, DocumentModel};

/// Program name looked up on `PATH` when no explicit binary is configured.
pub const DEFAULT_DOCLING_PROGRAM: &str = "docling";

/// Maximum number of stderr bytes kept in a [`ConvertError::Failed`].
const STDERR_TAIL_BYTES: usize = 2048;

/// stderr fragments docling prints when it does not accept the input format.
const UNSUPPORTED_FORMAT_MARKERS: &[&str] = &[
    "File format not allowed",
    "does not match any allowed format",
];

/// stderr fragments docling prints when the input fails validation.
const INVALID_DOCUMENT_MARKERS: &[&str] = &["is not valid"];

/// A document converted by docling, holding both of its exports.
#[derive(Debug, Clone)]
pub struct DoclingDocument {
    markdown: String,
    json: serde_json::Value,
}

impl DoclingDocument {
    pub fn new(markdown: String, json: serde_json::Value) -> Self {
        Self { markdown, json }
    }
}

impl DocumentModel for DoclingDocument {
    fn export_to_markdown(&self) -> String {
        self.markdown.clone()
    }

    fn export_to_json(&self) -> Result<serde_json::Value, ConvertError> {
        Ok(self.json.clone())
    }
}

/// Converter that shells out to docling.
#[derive(Debug, Clone)]
pub struct DoclingCliConverter {
    /// Program to execute (`docling` or an absolute path)
    program: PathBuf,

    /// Extra arguments placed before the generated ones
    extra_args: Vec<String>,

    /// Directory for docling output directories (system temp dir if None)
    work_dir: Option<PathBuf>,
}

impl Default for DoclingCliConverter {
    fn default() -> Self {
        Self::new(DEFAULT_DOCLING_PROGRAM)
    }
}

impl DoclingCliConverter {
    /// Create a converter running the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            work_dir: None,
        }
    }

    /// Pass extra arguments to every invocation (e.g. `--no-ocr`).
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Create output directories under `dir` instead of the system temp dir.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn extra_args(&self) -> &[String] {
        &self.extra_args
    }

    async fn output_dir(&self) -> Result<TempDir, ConvertError> {
        let work_dir = self.work_dir.clone();
        let dir = tokio::task::spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix("docling-out-");
            match work_dir {
                Some(root) => builder.tempdir_in(root),
                None => builder.tempdir(),
            }
        })
        .await
        .map_err(|e| ConvertError::Io(format!("output dir task failed: {}", e)))??;
        Ok(dir)
    }

    fn build_command(&self, source: &Path, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.extra_args)
            .args(["--to", "md", "--to", "json"])
            .args(["--image-export-mode", "placeholder"])
            .arg("--output")
            .arg(output_dir)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn_error(&self, err: std::io::Error) -> ConvertError {
        if err.kind() == std::io::ErrorKind::NotFound {
            ConvertError::Unavailable(format!(
                "'{}' not found; install docling or set --docling-bin",
                self.program.display()
            ))
        } else {
            ConvertError::Unavailable(format!(
                "failed to start '{}': {}",
                self.program.display(),
                err
            ))
        }
    }
}

#[async_trait]
impl DocumentConverter for DoclingCliConverter {
    type Document = DoclingDocument;

    fn name(&self) -> &str {
        "docling"
    }

    async fn probe(&self) -> Result<String, ConvertError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("docling (unknown version)");
        Ok(version.to_string())
    }

    async fn convert(&self, path: &Path) -> Result<DoclingDocument, ConvertError> {
        // On early returns the directory is removed by drop on this thread
        let output_dir = self.output_dir().await?;

        debug!(
            program = %self.program.display(),
            source = %path.display(),
            output = %output_dir.path().display(),
            "Running docling"
        );

        let output = self
            .build_command(path, output_dir.path())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let err = classify_failure(output.status.to_string(), stderr_tail(&output.stderr));
            warn!(status = %output.status, "docling exited unsuccessfully: {}", err);
            return Err(err);
        }

        let markdown_path = find_output(output_dir.path(), "md").await?;
        let json_path = find_output(output_dir.path(), "json").await?;

        let markdown = tokio::fs::read_to_string(&markdown_path)
            .await
            .map_err(|e| ConvertError::InvalidOutput(format!("reading markdown: {}", e)))?;
        let json_bytes = tokio::fs::read(&json_path)
            .await
            .map_err(|e| ConvertError::InvalidOutput(format!("reading json: {}", e)))?;
        let json = serde_json::from_slice(&json_bytes)
            .map_err(|e| ConvertError::InvalidOutput(format!("parsing json: {}", e)))?;

        tokio::task::spawn_blocking(move || output_dir.close())
            .await
            .map_err(|e| ConvertError::Io(format!("output cleanup task failed: {}", e)))??;

        Ok(DoclingDocument::new(markdown, json))
    }
}

/// Map a failed docling run to the most specific error kind its stderr names.
fn classify_failure(status: String, stderr: String) -> ConvertError {
    if let Some(line) = find_marker_line(&stderr, UNSUPPORTED_FORMAT_MARKERS) {
        return ConvertError::UnsupportedFormat {
            reason: line.to_string(),
        };
    }
    if let Some(line) = find_marker_line(&stderr, INVALID_DOCUMENT_MARKERS) {
        return ConvertError::InvalidDocument(line.to_string());
    }
    ConvertError::Failed { status, stderr }
}

fn find_marker_line<'a>(stderr: &'a str, markers: &[&str]) -> Option<&'a str> {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| markers.iter().any(|marker| line.contains(marker)))
}

/// Locate the single file with `extension` in docling's output directory.
async fn find_output(dir: &Path, extension: &str) -> Result<PathBuf, ConvertError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut found: Option<PathBuf> = None;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension() == Some(OsStr::new(extension)) {
            if found.is_some() {
                return Err(ConvertError::InvalidOutput(format!(
                    "docling produced more than one .{} file",
                    extension
                )));
            }
            found = Some(path);
        }
    }

    found.ok_or_else(|| {
        ConvertError::InvalidOutput(format!("docling produced no .{} output", extension))
    })
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
