use thiserror::Error;

/// Errors from the audio backend or the playback controller.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The backend could not acquire or start the sound.
    #[error("Audio start failed: {0}")]
    Start(String),

    /// The backend failed to release a playing handle.
    #[error("Audio stop failed: {0}")]
    Stop(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;
