use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rouse_audio::SoundPlaybackController;
use tracing::{debug, info};

use rouse_core::AlarmId;

use crate::{error::Result, scheduler::NotificationScheduler, store::AlarmStore};

/// Handles the snooze action on a firing alarm.
///
/// Snooze defers with a single one-shot entry; the alarm's regular
/// repeating entries are left untouched.
pub struct SnoozeManager {
    store: Arc<AlarmStore>,
    scheduler: Arc<NotificationScheduler>,
    playback: Arc<SoundPlaybackController>,
}

impl SnoozeManager {
    pub fn new(
        store: Arc<AlarmStore>,
        scheduler: Arc<NotificationScheduler>,
        playback: Arc<SoundPlaybackController>,
    ) -> Self {
        Self {
            store,
            scheduler,
            playback,
        }
    }

    /// Defer the alarm by its snooze duration from `now` and silence it.
    ///
    /// Unknown id or disabled snooze is a silent no-op. The sound is
    /// stopped unconditionally, even when scheduling the deferred entry
    /// failed — a stuck alarm sound is the worse outcome.
    pub async fn snooze(&self, id: &AlarmId, now: DateTime<Utc>) -> Result<()> {
        let Some(alarm) = self.store.get(id).await else {
            debug!(alarm_id = %id, "snooze ignored: unknown alarm");
            return Ok(());
        };
        if !alarm.snooze_enabled {
            debug!(alarm_id = %id, "snooze ignored: disabled for this alarm");
            return Ok(());
        }

        let deferred = now + Duration::minutes(i64::from(alarm.snooze_minutes));
        let scheduled = self.scheduler.schedule_snooze(&alarm, deferred).await;
        self.playback.stop().await;

        if scheduled.is_ok() {
            info!(alarm_id = %id, minutes = alarm.snooze_minutes, %deferred, "alarm snoozed");
        }
        scheduled
    }
}
