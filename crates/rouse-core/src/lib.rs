//! `rouse-core` — shared domain types for the alarm subsystem.
//!
//! Everything here is consumed by the store/scheduler crate
//! (`rouse-alarms`), the playback crate (`rouse-audio`), and the CLI:
//! the [`alarm::Alarm`] record and its closed enums, the canonical
//! [`types::Weekday`] numbering, and the figment-backed
//! [`config::RouseConfig`].

pub mod alarm;
pub mod config;
pub mod error;
pub mod types;

pub use alarm::{Alarm, AlarmCategory, AlarmDraft, AlarmPatch, AlarmSound, VibrationPattern};
pub use error::{CoreError, Result};
pub use types::{AlarmId, ClockTime, Weekday};
