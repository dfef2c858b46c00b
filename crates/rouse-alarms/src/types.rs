use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rouse_core::{AlarmId, Weekday};

use crate::platform::NotificationHandle;

/// What produced a scheduled notification entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationOrigin {
    /// Regular clock entry; `repeat_day` is `None` for a one-shot alarm.
    Clock { repeat_day: Option<Weekday> },

    /// Deferred one-shot created by a snooze action.
    Snooze,
}

/// Bookkeeping record for one live platform notification.
///
/// `alarm_id` is a back-reference for lookup only — the entry does not
/// keep the alarm alive, and the entry itself disappears from the live
/// set when cancelled (or, for one-shots, when the platform consumes it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub alarm_id: AlarmId,
    /// First upcoming fire instant at the time of scheduling. Weekly
    /// entries keep re-triggering past it; the platform owns that.
    pub scheduled_for: DateTime<Utc>,
    pub handle: NotificationHandle,
    pub origin: NotificationOrigin,
}

impl ScheduledNotification {
    pub fn is_snooze(&self) -> bool {
        matches!(self.origin, NotificationOrigin::Snooze)
    }
}
