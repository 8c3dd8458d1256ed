use std::path::PathBuf;

/// Result alias that carries the custom [`AlertError`] type.
pub type Result<T> = std::result::Result<T, AlertError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// The alert clip could not be found on disk.
    #[error("audio file `{}` was not found", .0.display())]
    MissingAudio(PathBuf),
    /// The audio backend failed to open, decode or play the clip.
    #[error("error playing sound: {0}")]
    Playback(String),
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed configuration file.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl AlertError {
    pub fn playback<T: Into<String>>(msg: T) -> Self {
        Self::Playback(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    /// Returns `true` for the errors the alert loop logs and survives.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingAudio(_) | Self::Playback(_))
    }
}
