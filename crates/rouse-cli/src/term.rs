use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rouse_audio::{AudioBackend, AudioError, PlaybackHandle};
use tracing::info;

/// Terminal stand-in for the host audio stack: announces start/stop
/// instead of decoding audio. The real backend on a device is the OS
/// media player.
#[derive(Default)]
pub struct TerminalAudioBackend {
    next: AtomicU64,
}

#[async_trait]
impl AudioBackend for TerminalAudioBackend {
    async fn start(&self, asset: &str) -> Result<PlaybackHandle, AudioError> {
        let handle = PlaybackHandle(self.next.fetch_add(1, Ordering::SeqCst) + 1);
        info!(%handle, %asset, "alarm sound started");
        println!("  ♪ playing {asset}");
        Ok(handle)
    }

    async fn stop(&self, handle: PlaybackHandle) -> Result<(), AudioError> {
        info!(%handle, "alarm sound stopped");
        Ok(())
    }
}
