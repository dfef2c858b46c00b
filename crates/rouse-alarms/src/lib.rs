//! `rouse-alarms` — alarm store, notification scheduling, and snooze.
//!
//! # Overview
//!
//! [`store::AlarmStore`] owns the authoritative in-memory alarm set and
//! delegates persistence to a [`storage::Storage`] implementation. After
//! every mutation it asks [`scheduler::NotificationScheduler`] to
//! reconcile the alarm's live platform notifications (cancel stale
//! entries, compute fresh trigger instants via [`occurrence`], schedule
//! new entries). [`snooze::SnoozeManager`] handles a firing alarm's
//! snooze action as a single deferred one-shot entry.
//!
//! # Trigger variants
//!
//! | Variant   | Behaviour                                        |
//! |-----------|--------------------------------------------------|
//! | `OneShot` | Single fire at an absolute UTC instant           |
//! | `Weekly`  | Fires every week on a fixed weekday at HH:MM UTC |
//!
//! All timing is delegated to the notification platform's own wake
//! mechanism; this crate only computes instants and issues
//! schedule/cancel calls — there is no polling loop.

pub mod db;
pub mod error;
pub mod occurrence;
pub mod platform;
pub mod scheduler;
pub mod snooze;
pub mod storage;
pub mod store;
pub mod types;

pub use error::{AlarmError, Result};
pub use platform::{
    FiredAlarm, NotificationHandle, NotificationPayload, NotificationPlatform,
    NotificationTrigger, TimerPlatform,
};
pub use scheduler::NotificationScheduler;
pub use snooze::SnoozeManager;
pub use storage::{MemoryStorage, SqliteStorage, Storage};
pub use store::AlarmStore;
pub use types::{NotificationOrigin, ScheduledNotification};
