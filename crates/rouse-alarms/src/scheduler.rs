use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use rouse_core::{Alarm, AlarmId, Weekday};

use crate::{
    error::{AlarmError, Result},
    occurrence,
    platform::{NotificationPayload, NotificationPlatform, NotificationTrigger},
    types::{NotificationOrigin, ScheduledNotification},
};

/// Keeps each alarm's live platform notifications in lockstep with its
/// configuration.
///
/// The map is pure bookkeeping; every side effect goes through the
/// platform adapter. Invariant after a successful [`resync`]: an enabled
/// alarm has one live entry (one-shot) or one per repeat day; a disabled
/// alarm has none.
///
/// [`resync`]: NotificationScheduler::resync
pub struct NotificationScheduler {
    platform: Arc<dyn NotificationPlatform>,
    live: Mutex<HashMap<AlarmId, Vec<ScheduledNotification>>>,
}

impl NotificationScheduler {
    pub fn new(platform: Arc<dyn NotificationPlatform>) -> Self {
        Self {
            platform,
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Reconcile `alarm`'s live entries with its current configuration:
    /// cancel everything, then recreate from scratch if enabled.
    ///
    /// A schedule failure for one repeat day leaves that entry absent;
    /// the remaining days are still attempted and the failure is
    /// reported, never swallowed.
    pub async fn resync(&self, alarm: &Alarm) -> Result<()> {
        self.cancel_all(&alarm.id).await?;
        if !alarm.enabled {
            debug!(alarm_id = %alarm.id, "alarm disabled; empty live set is terminal");
            return Ok(());
        }

        let now = Utc::now();
        let mut entries = Vec::new();
        let mut failed: Vec<String> = Vec::new();

        if alarm.repeat_days.is_empty() {
            let at = next_one_shot(now, alarm)?;
            match self
                .platform
                .schedule(NotificationTrigger::OneShot { at }, clock_payload(alarm, None))
                .await
            {
                Ok(handle) => entries.push(ScheduledNotification {
                    alarm_id: alarm.id.clone(),
                    scheduled_for: at,
                    handle,
                    origin: NotificationOrigin::Clock { repeat_day: None },
                }),
                Err(e) => failed.push(format!("one-shot: {e}")),
            }
        } else {
            for &day in &alarm.repeat_days {
                let Some(at) = occurrence::next_weekly(now, alarm.time, day) else {
                    failed.push(format!("{day}: no occurrence for {}", alarm.time));
                    continue;
                };
                let trigger = NotificationTrigger::Weekly {
                    day,
                    hour: alarm.time.hour(),
                    minute: alarm.time.minute(),
                };
                match self
                    .platform
                    .schedule(trigger, clock_payload(alarm, Some(day)))
                    .await
                {
                    Ok(handle) => entries.push(ScheduledNotification {
                        alarm_id: alarm.id.clone(),
                        scheduled_for: at,
                        handle,
                        origin: NotificationOrigin::Clock {
                            repeat_day: Some(day),
                        },
                    }),
                    Err(e) => {
                        warn!(alarm_id = %alarm.id, %day, error = %e, "repeat-day schedule failed");
                        failed.push(format!("{day}: {e}"));
                    }
                }
            }
        }

        let scheduled = entries.len();
        self.live.lock().await.insert(alarm.id.clone(), entries);
        info!(alarm_id = %alarm.id, scheduled, "alarm resynced");

        if failed.is_empty() {
            Ok(())
        } else {
            Err(AlarmError::Platform(format!(
                "schedule failed for alarm {}: {}",
                alarm.id,
                failed.join("; ")
            )))
        }
    }

    /// Add exactly one snooze-tagged one-shot entry at `at`, leaving the
    /// alarm's regular entries untouched.
    pub async fn schedule_snooze(&self, alarm: &Alarm, at: DateTime<Utc>) -> Result<()> {
        let mut payload = clock_payload(alarm, None);
        payload.snooze = true;
        let handle = self
            .platform
            .schedule(NotificationTrigger::OneShot { at }, payload)
            .await?;

        self.live
            .lock()
            .await
            .entry(alarm.id.clone())
            .or_default()
            .push(ScheduledNotification {
                alarm_id: alarm.id.clone(),
                scheduled_for: at,
                handle,
                origin: NotificationOrigin::Snooze,
            });
        info!(alarm_id = %alarm.id, %at, "snooze scheduled");
        Ok(())
    }

    /// Cancel every live entry for `alarm_id`, in the platform and in the
    /// bookkeeping map. Idempotent: a second call finds an empty set and
    /// succeeds without platform traffic.
    pub async fn cancel_all(&self, alarm_id: &AlarmId) -> Result<()> {
        let entries = self
            .live
            .lock()
            .await
            .remove(alarm_id)
            .unwrap_or_default();

        let mut failed: Vec<String> = Vec::new();
        for entry in &entries {
            if let Err(e) = self.platform.cancel(&entry.handle).await {
                warn!(alarm_id = %alarm_id, handle = %entry.handle, error = %e, "cancel failed");
                failed.push(e.to_string());
            }
        }
        if !entries.is_empty() {
            debug!(alarm_id = %alarm_id, cancelled = entries.len(), "live entries cancelled");
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(AlarmError::Platform(format!(
                "cancel failed for alarm {alarm_id}: {}",
                failed.join("; ")
            )))
        }
    }

    /// Number of live entries tracked for `alarm_id`.
    pub async fn live_count(&self, alarm_id: &AlarmId) -> usize {
        self.live
            .lock()
            .await
            .get(alarm_id)
            .map_or(0, |entries| entries.len())
    }

    /// Snapshot of the live entries for `alarm_id`.
    pub async fn live_entries(&self, alarm_id: &AlarmId) -> Vec<ScheduledNotification> {
        self.live
            .lock()
            .await
            .get(alarm_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn next_one_shot(now: DateTime<Utc>, alarm: &Alarm) -> Result<DateTime<Utc>> {
    occurrence::next_one_shot(now, alarm.time).ok_or_else(|| {
        AlarmError::Occurrence(format!(
            "no occurrence for alarm {} at {}",
            alarm.id, alarm.time
        ))
    })
}

fn clock_payload(alarm: &Alarm, repeat_day: Option<Weekday>) -> NotificationPayload {
    NotificationPayload {
        alarm_id: alarm.id.clone(),
        title: alarm.title.clone(),
        body: alarm.description.clone(),
        sound: alarm.sound,
        vibration: alarm.vibration_enabled.then_some(alarm.vibration),
        snooze: false,
        repeat_day,
    }
}
