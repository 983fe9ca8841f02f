//! Conversion pipeline: staging uploads and running the converter.
//!
//! - [`StagedUpload`] - upload copied into a private temp directory, removed on drop
//! - [`ConversionService`] - stages uploads and calls the converter once per upload

mod service;
mod staging;

pub use service::{ConversionOutput, ConversionService};
pub use staging::{sanitize_file_name, StagedUpload, DEFAULT_UPLOAD_NAME};
