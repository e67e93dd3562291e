use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open audio output: {0}")]
    Output(String),
    #[error("failed to open audio track {}: {source}", path.display())]
    Track {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode audio track {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("failed to start playback: {0}")]
    Playback(String),
    #[error("audio graph has no sources")]
    EmptyGraph,
}

impl AudioError {
    /// Track errors are recoverable by falling back to synthesized tones.
    pub fn is_track_error(&self) -> bool {
        matches!(self, AudioError::Track { .. } | AudioError::Decode { .. })
    }
}
