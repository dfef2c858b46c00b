use async_trait::async_trait;

use crate::error::AudioError;

/// Opaque identifier for a playing sound, issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackHandle(pub u64);

impl std::fmt::Display for PlaybackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform audio adapter (the real one is the host OS media stack).
///
/// Implementations must be `Send + Sync` so the controller can be shared
/// across Tokio tasks.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Acquire and start playing the asset at `asset` (looping until stopped).
    async fn start(&self, asset: &str) -> Result<PlaybackHandle, AudioError>;

    /// Release the resource behind `handle`.
    ///
    /// Stopping an already-released handle should be treated as success.
    async fn stop(&self, handle: PlaybackHandle) -> Result<(), AudioError>;
}
