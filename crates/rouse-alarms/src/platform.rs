//! Notification platform seam and the in-process timer implementation.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use rouse_core::{AlarmId, AlarmSound, ClockTime, VibrationPattern, Weekday};

use crate::{error::AlarmError, occurrence};

/// Opaque identifier returned by the notification platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationHandle(pub String);

impl NotificationHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NotificationHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// When the platform should fire a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationTrigger {
    /// Fire exactly once at the given UTC instant.
    OneShot { at: DateTime<Utc> },

    /// Fire every week on `day` at the given time (UTC). The platform
    /// re-triggers these itself; the scheduler never reschedules them.
    Weekly { day: Weekday, hour: u8, minute: u8 },
}

/// Content attached to a scheduled notification.
///
/// Carries enough for the firing handler to identify the alarm, whether
/// the entry is snooze-originated, and which repeat day produced it —
/// weekday entries are cancelled and rescheduled as a group, never
/// partially, so the handler must be able to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub alarm_id: AlarmId,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub sound: AlarmSound,
    /// `None` when the alarm has vibration disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration: Option<VibrationPattern>,
    /// True for the deferred one-shot created by a snooze action.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub snooze: bool,
    /// The repeat day that produced this entry, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_day: Option<Weekday>,
}

/// A notification the platform has delivered.
#[derive(Debug, Clone)]
pub struct FiredAlarm {
    pub payload: NotificationPayload,
    pub fired_at: DateTime<Utc>,
}

/// External notification platform (the real one is the host OS).
///
/// Cancellation must be idempotent: the platform may already have
/// consumed a one-shot entry, and "already gone" is success.
#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    async fn schedule(
        &self,
        trigger: NotificationTrigger,
        payload: NotificationPayload,
    ) -> Result<NotificationHandle, AlarmError>;

    async fn cancel(&self, handle: &NotificationHandle) -> Result<(), AlarmError>;
}

/// In-process platform backed by Tokio timers.
///
/// Each scheduled entry is one task: one-shots sleep until their instant
/// and fire once; weekly entries compute the next occurrence, sleep,
/// fire, and loop. Fired notifications are forwarded over an mpsc
/// channel with a non-blocking `try_send` so a slow consumer never
/// stalls a timer.
pub struct TimerPlatform {
    fired_tx: mpsc::Sender<FiredAlarm>,
    tasks: StdMutex<HashMap<NotificationHandle, JoinHandle<()>>>,
}

impl TimerPlatform {
    pub fn new(fired_tx: mpsc::Sender<FiredAlarm>) -> Self {
        Self {
            fired_tx,
            tasks: StdMutex::new(HashMap::new()),
        }
    }

    /// Number of timer tasks that have not yet fired or been cancelled.
    pub fn pending(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.retain(|_, task| !task.is_finished());
        tasks.len()
    }
}

impl Drop for TimerPlatform {
    fn drop(&mut self) {
        for (_, task) in self.tasks.lock().unwrap().drain() {
            task.abort();
        }
    }
}

#[async_trait]
impl NotificationPlatform for TimerPlatform {
    async fn schedule(
        &self,
        trigger: NotificationTrigger,
        payload: NotificationPayload,
    ) -> Result<NotificationHandle, AlarmError> {
        let handle = NotificationHandle::new();
        let tx = self.fired_tx.clone();

        let task = match trigger {
            NotificationTrigger::OneShot { at } => tokio::spawn(async move {
                sleep_until(at).await;
                deliver(&tx, payload);
            }),
            NotificationTrigger::Weekly { day, hour, minute } => {
                let time = ClockTime::new(hour, minute).ok_or_else(|| {
                    AlarmError::Occurrence(format!("invalid weekly trigger time {hour}:{minute}"))
                })?;
                tokio::spawn(async move {
                    loop {
                        if tx.is_closed() {
                            break;
                        }
                        let Some(next) = occurrence::next_weekly(Utc::now(), time, day) else {
                            break;
                        };
                        sleep_until(next).await;
                        deliver(&tx, payload.clone());
                    }
                })
            }
        };

        let mut tasks = self.tasks.lock().unwrap();
        tasks.retain(|_, t| !t.is_finished());
        tasks.insert(handle.clone(), task);
        Ok(handle)
    }

    async fn cancel(&self, handle: &NotificationHandle) -> Result<(), AlarmError> {
        // Unknown or already-fired handles are success, not an error.
        if let Some(task) = self.tasks.lock().unwrap().remove(handle) {
            task.abort();
        }
        Ok(())
    }
}

async fn sleep_until(at: DateTime<Utc>) {
    let wait = (at - Utc::now()).to_std().unwrap_or_default();
    tokio::time::sleep(wait).await;
}

fn deliver(tx: &mpsc::Sender<FiredAlarm>, payload: NotificationPayload) {
    let fired = FiredAlarm {
        payload,
        fired_at: Utc::now(),
    };
    if let Err(e) = tx.try_send(fired) {
        warn!(error = %e, "delivery channel full or closed — notification dropped");
    }
}
