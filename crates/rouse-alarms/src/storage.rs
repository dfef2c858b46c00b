//! Storage seam and its two implementations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::warn;

use rouse_core::{Alarm, AlarmId};

use crate::{
    db::init_db,
    error::{AlarmError, Result},
};

/// Persistence collaborator for the alarm store.
///
/// Called on store open (`load`) and after every mutating operation
/// (`save`, whole-set replacement). A `save` failure is non-fatal to the
/// in-memory operation; the store logs it and surfaces it to the caller.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn load(&self) -> Result<Vec<Alarm>>;
    async fn save(&self, alarms: &[Alarm]) -> Result<()>;
}

/// SQLite-backed storage.
///
/// Uses its own `Connection` behind a mutex so async callers can share
/// it; every call is a short synchronous transaction.
pub struct SqliteStorage {
    conn: Arc<StdMutex<Connection>>,
}

impl SqliteStorage {
    /// Wrap an open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(StdMutex::new(conn)),
        })
    }

    /// Open (or create) the database file at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::new(conn)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn load(&self) -> Result<Vec<Alarm>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, time, enabled, repeat_days, sound, snooze_enabled,
                    snooze_minutes, vibration_enabled, vibration, category,
                    title, description, created_at, updated_at
             FROM alarms ORDER BY created_at",
        )?;

        let alarms = stmt
            .query_map([], |row| {
                Ok(AlarmRow {
                    id: row.get(0)?,
                    time: row.get(1)?,
                    enabled: row.get(2)?,
                    repeat_days: row.get(3)?,
                    sound: row.get(4)?,
                    snooze_enabled: row.get(5)?,
                    snooze_minutes: row.get(6)?,
                    vibration_enabled: row.get(7)?,
                    vibration: row.get(8)?,
                    category: row.get(9)?,
                    title: row.get(10)?,
                    description: row.get(11)?,
                    created_at: row.get(12)?,
                    updated_at: row.get(13)?,
                })
            })?
            .filter_map(|r| {
                let row = r.ok()?;
                let id = row.id.clone();
                match row.into_alarm() {
                    Some(alarm) => Some(alarm),
                    None => {
                        // Bad rows are skipped, not coerced to defaults.
                        warn!(alarm_id = %id, "skipping unparseable alarm row");
                        None
                    }
                }
            })
            .collect();

        Ok(alarms)
    }

    async fn save(&self, alarms: &[Alarm]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM alarms", [])?;
        for alarm in alarms {
            let repeat_days = serde_json::to_string(&alarm.repeat_days)?;
            tx.execute(
                "INSERT INTO alarms
                 (id, time, enabled, repeat_days, sound, snooze_enabled,
                  snooze_minutes, vibration_enabled, vibration, category,
                  title, description, created_at, updated_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
                rusqlite::params![
                    alarm.id.as_str(),
                    alarm.time.to_string(),
                    alarm.enabled,
                    repeat_days,
                    alarm.sound.to_string(),
                    alarm.snooze_enabled,
                    alarm.snooze_minutes,
                    alarm.vibration_enabled,
                    alarm.vibration.to_string(),
                    alarm.category.to_string(),
                    alarm.title,
                    alarm.description,
                    alarm.created_at.to_rfc3339(),
                    alarm.updated_at.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Raw row shape; parsed leniently into an [`Alarm`].
struct AlarmRow {
    id: String,
    time: String,
    enabled: bool,
    repeat_days: String,
    sound: String,
    snooze_enabled: bool,
    snooze_minutes: u32,
    vibration_enabled: bool,
    vibration: String,
    category: String,
    title: String,
    description: String,
    created_at: String,
    updated_at: String,
}

impl AlarmRow {
    fn into_alarm(self) -> Option<Alarm> {
        Some(Alarm {
            id: AlarmId::from(self.id),
            time: self.time.parse().ok()?,
            enabled: self.enabled,
            repeat_days: serde_json::from_str(&self.repeat_days).ok()?,
            sound: self.sound.parse().ok()?,
            snooze_enabled: self.snooze_enabled,
            snooze_minutes: self.snooze_minutes,
            vibration_enabled: self.vibration_enabled,
            vibration: self.vibration.parse().ok()?,
            category: self.category.parse().ok()?,
            title: self.title,
            description: self.description,
            created_at: parse_rfc3339(&self.created_at)?,
            updated_at: parse_rfc3339(&self.updated_at)?,
        })
    }
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// In-memory storage with injectable save failures. Used for ephemeral
/// runs and as the test double for persistence-error paths.
#[derive(Default)]
pub struct MemoryStorage {
    alarms: StdMutex<Vec<Alarm>>,
    fail_saves: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail with a persistence error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// The last successfully saved snapshot.
    pub fn saved(&self) -> Vec<Alarm> {
        self.alarms.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load(&self) -> Result<Vec<Alarm>> {
        Ok(self.alarms.lock().unwrap().clone())
    }

    async fn save(&self, alarms: &[Alarm]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AlarmError::Persistence("save failure (injected)".into()));
        }
        *self.alarms.lock().unwrap() = alarms.to_vec();
        Ok(())
    }
}
