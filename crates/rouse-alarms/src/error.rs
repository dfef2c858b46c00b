use thiserror::Error;

/// Errors that can occur within the alarm subsystem.
///
/// Nothing here is fatal to the process; every failure is scoped to the
/// single operation that triggered it.
#[derive(Debug, Error)]
pub enum AlarmError {
    /// The operation referenced an unknown alarm id. No state change.
    #[error("Alarm not found: {id}")]
    NotFound { id: String },

    /// The storage collaborator failed. The in-memory operation still
    /// completed; this is surfaced for observability.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Underlying SQLite / rusqlite error (the SQLite face of persistence).
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A notification platform schedule/cancel call failed.
    #[error("Notification platform error: {0}")]
    Platform(String),

    /// No trigger instant could be computed for the alarm time.
    #[error("Occurrence error: {0}")]
    Occurrence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Audio error: {0}")]
    Audio(#[from] rouse_audio::AudioError),
}

pub type Result<T> = std::result::Result<T, AlarmError>;
