//! Configuration management for the conversion gateway.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use docling_gateway::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Check(config) => println!("Checking {:?}", config.converter.converter),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `DOCLING_GATEWAY_HOST` - Server bind address (default: 0.0.0.0)
//! - `DOCLING_GATEWAY_PORT` - Server port (default: 8000)
//! - `DOCLING_KEY` - Shared secret for the `X-Docling-Key` header (unset = open access)
//! - `DOCLING_GATEWAY_CONVERTER` - Converter backend, `docling` or `text` (default: docling)
//! - `DOCLING_BIN` - docling executable (default: docling)
//! - `DOCLING_GATEWAY_CONVERT_TIMEOUT` - Conversion timeout in seconds (default: none)
//! - `DOCLING_GATEWAY_MAX_UPLOAD_MB` - Upload size limit in MiB (default: none)
//! - `DOCLING_GATEWAY_TEMP_DIR` - Directory for staged uploads (default: system temp dir)
//! - `DOCLING_GATEWAY_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::converter::DEFAULT_DOCLING_PROGRAM;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// docling-gateway - convert uploaded documents to Markdown and JSON.
///
/// Runs the HTTP server when no subcommand is given.
#[derive(Parser, Debug, Clone)]
#[command(name = "docling-gateway")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// Resolve the command to run, defaulting to `serve`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve(ServeConfig),

    /// Verify the converter and temp directory, then exit
    Check(CheckConfig),
}

/// Converter backend selection.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    /// External docling command-line tool
    Docling,

    /// Built-in plain text and Markdown converter
    Text,
}

impl std::fmt::Display for ConverterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConverterKind::Docling => write!(f, "docling"),
            ConverterKind::Text => write!(f, "text"),
        }
    }
}

/// Options shared by `serve` and `check`.
#[derive(Args, Debug, Clone)]
pub struct ConverterArgs {
    /// Converter backend.
    #[arg(long, value_enum, default_value_t = ConverterKind::Docling, env = "DOCLING_GATEWAY_CONVERTER")]
    pub converter: ConverterKind,

    /// docling executable name or path.
    #[arg(long, default_value = DEFAULT_DOCLING_PROGRAM, env = "DOCLING_BIN")]
    pub docling_bin: PathBuf,

    /// Extra argument passed to docling (repeatable), e.g. `--docling-arg=--no-ocr`.
    #[arg(long = "docling-arg", allow_hyphen_values = true)]
    pub docling_args: Vec<String>,

    /// Directory for staged uploads and converter output.
    ///
    /// If not specified, uses the system temp directory.
    #[arg(long, env = "DOCLING_GATEWAY_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,
}

impl ConverterArgs {
    /// Directory uploads are staged under.
    pub fn temp_root(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Validate the converter options.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref dir) = self.temp_dir {
            if !dir.is_dir() {
                return Err(format!(
                    "temp_dir '{}' does not exist or is not a directory",
                    dir.display()
                ));
            }
        }

        if self.converter == ConverterKind::Docling && self.docling_bin.as_os_str().is_empty() {
            return Err("docling_bin must not be empty. Set --docling-bin or DOCLING_BIN".to_string());
        }

        Ok(())
    }
}

/// Options for the HTTP server.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "DOCLING_GATEWAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DOCLING_GATEWAY_PORT")]
    pub port: u16,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Shared secret required in the X-Docling-Key header.
    ///
    /// When unset or empty, /convert is open to every client.
    #[arg(long, env = "DOCLING_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    // =========================================================================
    // Conversion Configuration
    // =========================================================================
    #[command(flatten)]
    pub converter: ConverterArgs,

    /// Abort a conversion after this many seconds.
    ///
    /// If not specified, conversions run until the converter returns.
    #[arg(long, env = "DOCLING_GATEWAY_CONVERT_TIMEOUT")]
    pub convert_timeout_secs: Option<u64>,

    /// Reject uploads larger than this many MiB.
    ///
    /// If not specified, uploads are not size-limited.
    #[arg(long, env = "DOCLING_GATEWAY_MAX_UPLOAD_MB")]
    pub max_upload_mb: Option<u64>,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "DOCLING_GATEWAY_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }

        if self.convert_timeout_secs == Some(0) {
            return Err("convert_timeout_secs must be greater than 0".to_string());
        }

        if self.max_upload_mb == Some(0) {
            return Err("max_upload_mb must be greater than 0".to_string());
        }

        self.converter.validate()
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The shared secret, if one is configured and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn convert_timeout(&self) -> Option<Duration> {
        self.convert_timeout_secs.map(Duration::from_secs)
    }

    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> Option<usize> {
        self.max_upload_mb
            .map(|mb| usize::try_from(mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX))
    }
}

/// Options for the `check` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub converter: ConverterArgs,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
