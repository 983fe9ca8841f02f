//! Scoped temporary storage for uploads.
//!
//! Each upload is written into its own randomly named directory under the
//! temp root, keeping the (sanitized) client file name so converters can
//! infer the format from the extension. The directory is removed when the
//! [`StagedUpload`] is dropped or closed, on every exit path.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::UploadError;

/// File name used when the client did not declare one.
pub const DEFAULT_UPLOAD_NAME: &str = "upload";

/// Maximum length of a staged file name in bytes.
const MAX_FILE_NAME_LEN: usize = 128;

/// Longest extension preserved when a file name is truncated.
const MAX_EXTENSION_LEN: usize = 16;

/// An upload copied to a private temporary file.
///
/// Field order matters: the file handle is closed before the directory is
/// removed.
#[derive(Debug)]
pub struct StagedUpload {
    file: Option<File>,
    path: PathBuf,
    file_name: String,
    written: u64,
    dir: TempDir,
}

impl StagedUpload {
    /// Create an empty staged upload under `root`.
    pub async fn create(root: &Path, declared_name: Option<&str>) -> Result<Self, UploadError> {
        let root = root.to_path_buf();
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix("upload-").tempdir_in(root)
        })
        .await
        .map_err(|e| UploadError::Io(format!("staging task failed: {}", e)))??;

        let file_name = sanitize_file_name(declared_name);
        let path = dir.path().join(&file_name);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        debug!(path = %path.display(), "Staged upload created");

        Ok(Self {
            file: Some(file),
            path,
            file_name,
            written: 0,
            dir,
        })
    }

    /// Append a chunk of upload data.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| UploadError::Io("upload already finished".to_string()))?;
        file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush all written data and close the file handle.
    ///
    /// Must be called before the path is handed to a converter. The data only
    /// has to be visible to local readers, so there is no fsync.
    pub async fn finish(&mut self) -> Result<(), UploadError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        Ok(())
    }

    /// Remove the staged file and its directory, reporting failures.
    ///
    /// Dropping the upload removes it too, silently and on the current
    /// thread. That path is only taken on errors and cancellation.
    pub async fn close(mut self) -> Result<(), UploadError> {
        drop(self.file.take());
        let path = self.path;
        let dir = self.dir;
        tokio::task::spawn_blocking(move || dir.close())
            .await
            .map_err(|e| UploadError::Io(format!("cleanup task failed: {}", e)))??;
        debug!(path = %path.display(), "Staged upload removed");
        Ok(())
    }

    /// Path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sanitized file name of the staged file.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Extension of the staged file, if any.
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> u64 {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }
}

/// Turn a client-declared file name into a safe single path component.
///
/// Directory parts are dropped, characters outside `[A-Za-z0-9._-]` become
/// `_`, and the extension survives truncation.
pub fn sanitize_file_name(declared: Option<&str>) -> String {
    let base = declared
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .unwrap_or("");

    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    let name = if trimmed.is_empty() {
        DEFAULT_UPLOAD_NAME.to_string()
    } else if cleaned.starts_with('.') {
        // ".pdf" keeps its extension
        format!("{}.{}", DEFAULT_UPLOAD_NAME, trimmed)
    } else {
        trimmed.to_string()
    };

    truncate_file_name(name)
}

fn truncate_file_name(name: String) -> String {
    if name.len() <= MAX_FILE_NAME_LEN {
        return name;
    }

    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= MAX_EXTENSION_LEN => {
            let keep = MAX_FILE_NAME_LEN - ext.len() - 1;
            format!("{}.{}", &stem[..keep.min(stem.len())], ext)
        }
        _ => name[..MAX_FILE_NAME_LEN].to_string(),
    }
}
