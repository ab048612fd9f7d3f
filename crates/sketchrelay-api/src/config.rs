//! Server configuration read from the environment.

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use sketchrelay_media::config::{CompositorConfig, DEFAULT_FONT_PATH};

use crate::error::AppError;

/// Default cap on an upload request body: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Runtime settings for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Directory blobs are stored under.
    pub blob_root: PathBuf,
    /// Caption font file.
    pub font_path: PathBuf,
    /// Edge length uploads are normalized to.
    pub upload_size: u32,
    /// Largest accepted upload request body.
    pub max_upload_bytes: usize,
    /// Caption frame display time.
    pub caption_delay_ms: u32,
    /// Drawing frame display time.
    pub drawing_delay_ms: u32,
    /// OTLP collector endpoint; tracing export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = CompositorConfig::default();

        let upload_size: u32 = parsed(&lookup, "UPLOAD_SIZE", defaults.upload_size)?;
        if upload_size == 0 {
            return Err(AppError::Config("UPLOAD_SIZE must be positive".to_owned()));
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parsed(&lookup, "PORT", 9119)?,
            blob_root: lookup("BLOB_ROOT").map_or_else(|| PathBuf::from("./data"), PathBuf::from),
            font_path: lookup("FONT_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_FONT_PATH), PathBuf::from),
            upload_size,
            max_upload_bytes: parsed(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            caption_delay_ms: parsed(&lookup, "CAPTION_DELAY_MS", defaults.caption_delay_ms)?,
            drawing_delay_ms: parsed(&lookup, "DRAWING_DELAY_MS", defaults.drawing_delay_ms)?,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .filter(|endpoint| !endpoint.trim().is_empty()),
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Compositor settings derived from this configuration.
    #[must_use]
    pub fn compositor_config(&self) -> CompositorConfig {
        CompositorConfig {
            caption_delay_ms: self.caption_delay_ms,
            drawing_delay_ms: self.drawing_delay_ms,
            font_path: self.font_path.clone(),
            upload_size: self.upload_size,
            ..CompositorConfig::default()
        }
    }
}

fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be a valid number: {e}"))),
        None => Ok(default),
    }
}
