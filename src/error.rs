//! Error type shared by the encoding, export, clipboard and history layers.
//!
//! Classification itself never fails; everything that touches the encoder, the filesystem or
//! the system clipboard reports through [`Error`].
use std::path::PathBuf;

use thiserror::Error;

use crate::qrcode::DataTooLong;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The payload does not fit in any QR version.
    #[error("payload does not fit in a QR code: {0}")]
    DataTooLong(#[from] DataTooLong),

    /// There is nothing to encode, export or copy.
    #[error("nothing to encode: the payload is empty")]
    EmptyPayload,

    #[error("invalid colour `{0}`: expected #RGB, #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    #[error("invalid render options: {0}")]
    InvalidOptions(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// History could not be serialized or parsed.
    #[error("history storage error: {0}")]
    Storage(#[from] serde_json::Error),

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no history entry with id {0}")]
    NotFound(String),
}

impl Error {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
