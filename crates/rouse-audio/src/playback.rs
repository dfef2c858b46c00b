use std::sync::Arc;

use rouse_core::AlarmSound;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    backend::{AudioBackend, PlaybackHandle},
    error::AudioError,
};

/// Two-state playback controller: `Idle` or `Playing(handle)`.
///
/// `play` replaces any active sound (full stop sequence first) and `stop`
/// is idempotent. The active handle is cleared on every error path, so a
/// failed start or a failed release never leaves a half-initialized
/// handle referenced.
pub struct SoundPlaybackController {
    backend: Arc<dyn AudioBackend>,
    active: Mutex<Option<PlaybackHandle>>,
}

impl SoundPlaybackController {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            active: Mutex::new(None),
        }
    }

    /// Start playing `sound`, stopping the currently playing one first.
    ///
    /// On start failure the controller ends `Idle` and the error is surfaced.
    pub async fn play(&self, sound: AlarmSound) -> Result<(), AudioError> {
        let mut active = self.active.lock().await;
        if let Some(old) = active.take() {
            debug!(handle = %old, "replacing active sound");
            if let Err(e) = self.backend.stop(old).await {
                // The handle is dropped regardless; leaking it is worse
                // than a failed release call.
                warn!(handle = %old, error = %e, "stop during replace failed");
            }
        }

        match self.backend.start(sound.asset()).await {
            Ok(handle) => {
                debug!(%sound, %handle, "sound playing");
                *active = Some(handle);
                Ok(())
            }
            Err(e) => {
                warn!(%sound, error = %e, "sound start failed");
                Err(e)
            }
        }
    }

    /// Stop the active sound, if any. Idempotent; always ends `Idle`.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        let Some(handle) = active.take() else {
            return;
        };
        if let Err(e) = self.backend.stop(handle).await {
            warn!(%handle, error = %e, "sound stop failed; handle dropped");
        } else {
            debug!(%handle, "sound stopped");
        }
    }

    /// Whether a sound is currently playing.
    pub async fn is_playing(&self) -> bool {
        self.active.lock().await.is_some()
    }
}
