use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AlarmId, ClockTime, Weekday};

/// Which bundled sound asset an alarm plays.
///
/// A closed enum: an unknown sound name is a deserialization error, not a
/// silent fallback, and a missing `asset()` entry is a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmSound {
    #[default]
    Classic,
    Digital,
    Gentle,
    Nature,
    Urgent,
}

impl AlarmSound {
    /// Path of the bundled audio asset, relative to the asset root.
    pub fn asset(self) -> &'static str {
        match self {
            AlarmSound::Classic => "sounds/classic_bell.mp3",
            AlarmSound::Digital => "sounds/digital_beep.mp3",
            AlarmSound::Gentle => "sounds/gentle_chime.mp3",
            AlarmSound::Nature => "sounds/morning_birds.mp3",
            AlarmSound::Urgent => "sounds/urgent_tone.mp3",
        }
    }
}

impl std::fmt::Display for AlarmSound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlarmSound::Classic => "classic",
            AlarmSound::Digital => "digital",
            AlarmSound::Gentle => "gentle",
            AlarmSound::Nature => "nature",
            AlarmSound::Urgent => "urgent",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AlarmSound {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "classic" => Ok(AlarmSound::Classic),
            "digital" => Ok(AlarmSound::Digital),
            "gentle" => Ok(AlarmSound::Gentle),
            "nature" => Ok(AlarmSound::Nature),
            "urgent" => Ok(AlarmSound::Urgent),
            other => Err(format!("unknown alarm sound: {other}")),
        }
    }
}

/// Descriptive grouping shown in the UI. No scheduling effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmCategory {
    Study,
    Exam,
    Break,
    #[default]
    Personal,
}

impl AlarmCategory {
    pub fn label(self) -> &'static str {
        match self {
            AlarmCategory::Study => "Study",
            AlarmCategory::Exam => "Exam",
            AlarmCategory::Break => "Break",
            AlarmCategory::Personal => "Personal",
        }
    }

    /// Accent color used when rendering the alarm card.
    pub fn color(self) -> &'static str {
        match self {
            AlarmCategory::Study => "#4F7CAC",
            AlarmCategory::Exam => "#C3423F",
            AlarmCategory::Break => "#5FAD56",
            AlarmCategory::Personal => "#8367C7",
        }
    }
}

impl std::fmt::Display for AlarmCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlarmCategory::Study => "study",
            AlarmCategory::Exam => "exam",
            AlarmCategory::Break => "break",
            AlarmCategory::Personal => "personal",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AlarmCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "study" => Ok(AlarmCategory::Study),
            "exam" => Ok(AlarmCategory::Exam),
            "break" => Ok(AlarmCategory::Break),
            "personal" => Ok(AlarmCategory::Personal),
            other => Err(format!("unknown alarm category: {other}")),
        }
    }
}

/// Vibration cue forwarded verbatim in notification payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VibrationPattern {
    #[default]
    Short,
    Long,
    Double,
    Off,
}

impl VibrationPattern {
    /// On/off durations in milliseconds, starting with an "on" segment.
    pub fn millis(self) -> &'static [u64] {
        match self {
            VibrationPattern::Short => &[250, 250],
            VibrationPattern::Long => &[800, 400],
            VibrationPattern::Double => &[250, 150, 250, 150],
            VibrationPattern::Off => &[],
        }
    }
}

impl std::fmt::Display for VibrationPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VibrationPattern::Short => "short",
            VibrationPattern::Long => "long",
            VibrationPattern::Double => "double",
            VibrationPattern::Off => "off",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for VibrationPattern {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "short" => Ok(VibrationPattern::Short),
            "long" => Ok(VibrationPattern::Long),
            "double" => Ok(VibrationPattern::Double),
            "off" => Ok(VibrationPattern::Off),
            other => Err(format!("unknown vibration pattern: {other}")),
        }
    }
}

/// A user-defined alarm record.
///
/// Owned exclusively by the alarm store; mutated only through its API.
/// `repeat_days` empty means a one-shot alarm: it fires at the next
/// occurrence of `time` and then stays enabled (never auto-disabled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    pub time: ClockTime,
    pub enabled: bool,
    /// Unique, order-irrelevant set of repeat weekdays. Empty = one-shot.
    #[serde(default)]
    pub repeat_days: BTreeSet<Weekday>,
    #[serde(default)]
    pub sound: AlarmSound,
    pub snooze_enabled: bool,
    pub snooze_minutes: u32,
    pub vibration_enabled: bool,
    #[serde(default)]
    pub vibration: VibrationPattern,
    #[serde(default)]
    pub category: AlarmCategory,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation payload: everything the caller decides, nothing the store assigns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmDraft {
    pub time: ClockTime,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub repeat_days: BTreeSet<Weekday>,
    #[serde(default)]
    pub sound: AlarmSound,
    #[serde(default = "default_true")]
    pub snooze_enabled: bool,
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u32,
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
    #[serde(default)]
    pub vibration: VibrationPattern,
    #[serde(default)]
    pub category: AlarmCategory,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl AlarmDraft {
    /// Build the stored record; the store supplies `id` and the timestamps.
    pub fn into_alarm(self, id: AlarmId, now: DateTime<Utc>) -> Alarm {
        Alarm {
            id,
            time: self.time,
            enabled: self.enabled,
            repeat_days: self.repeat_days,
            sound: self.sound,
            snooze_enabled: self.snooze_enabled,
            snooze_minutes: self.snooze_minutes,
            vibration_enabled: self.vibration_enabled,
            vibration: self.vibration,
            category: self.category,
            title: self.title,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update: only set fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmPatch {
    pub time: Option<ClockTime>,
    pub enabled: Option<bool>,
    pub repeat_days: Option<BTreeSet<Weekday>>,
    pub sound: Option<AlarmSound>,
    pub snooze_enabled: Option<bool>,
    pub snooze_minutes: Option<u32>,
    pub vibration_enabled: Option<bool>,
    pub vibration: Option<VibrationPattern>,
    pub category: Option<AlarmCategory>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl AlarmPatch {
    /// Merge the set fields into `alarm`. Timestamps are the store's job.
    pub fn apply(&self, alarm: &mut Alarm) {
        if let Some(time) = self.time {
            alarm.time = time;
        }
        if let Some(enabled) = self.enabled {
            alarm.enabled = enabled;
        }
        if let Some(days) = &self.repeat_days {
            alarm.repeat_days = days.clone();
        }
        if let Some(sound) = self.sound {
            alarm.sound = sound;
        }
        if let Some(snooze_enabled) = self.snooze_enabled {
            alarm.snooze_enabled = snooze_enabled;
        }
        if let Some(snooze_minutes) = self.snooze_minutes {
            alarm.snooze_minutes = snooze_minutes;
        }
        if let Some(vibration_enabled) = self.vibration_enabled {
            alarm.vibration_enabled = vibration_enabled;
        }
        if let Some(vibration) = self.vibration {
            alarm.vibration = vibration;
        }
        if let Some(category) = self.category {
            alarm.category = category;
        }
        if let Some(title) = &self.title {
            alarm.title = title.clone();
        }
        if let Some(description) = &self.description {
            alarm.description = description.clone();
        }
    }

    pub fn enable(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_snooze_minutes() -> u32 {
    crate::config::DEFAULT_SNOOZE_MINUTES
}
