//! Error kinds surfaced by the composition pipeline.
//!
//! Font fallback is deliberately absent here: a missing font degrades the
//! output but never stops a render, so it is reported as a `tracing` event
//! instead (see [`crate::text::font`]).

use std::path::PathBuf;

/// Errors produced while loading assets, composing, or writing output.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// An input image could not be read or decoded.
    #[error("failed to load asset {source_name}: {reason}")]
    AssetLoad { source_name: String, reason: String },

    /// The requested composition cannot be produced (zero-sized canvas,
    /// missing background image, pixel buffer allocation failure, ...).
    #[error("composition error: {message}")]
    Composition { message: String },

    /// The configuration profile is malformed or inconsistent.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The output file could not be written.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output image could not be encoded.
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Result type alias using [`ComposeError`].
pub type ComposeResult<T> = Result<T, ComposeError>;

impl ComposeError {
    pub fn asset_load(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::AssetLoad {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Returns true for failures caused by unreadable input images.
    pub fn is_asset_load(&self) -> bool {
        matches!(self, Self::AssetLoad { .. })
    }
}

impl From<serde_json::Error> for ComposeError {
    fn from(err: serde_json::Error) -> Self {
        Self::config(err.to_string())
    }
}
