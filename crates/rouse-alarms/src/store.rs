use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use rouse_core::{Alarm, AlarmDraft, AlarmId, AlarmPatch};

use crate::{
    error::{AlarmError, Result},
    scheduler::NotificationScheduler,
    storage::Storage,
};

/// Authoritative in-memory alarm collection.
///
/// Every mutation runs under one store-wide mutex, held across the
/// whole cancel-old / merge / persist / resync sequence, so two
/// concurrent operations on the same alarm can never interleave into
/// duplicate live notifications or a dropped reschedule.
///
/// Persistence failures are deliberately non-fatal: the in-memory
/// mutation (and the resync) complete, the failure is logged and
/// returned for observability.
pub struct AlarmStore {
    storage: Arc<dyn Storage>,
    scheduler: Arc<NotificationScheduler>,
    state: Mutex<HashMap<AlarmId, Alarm>>,
}

impl AlarmStore {
    /// Open the store, loading the persisted alarm set.
    pub async fn open(
        storage: Arc<dyn Storage>,
        scheduler: Arc<NotificationScheduler>,
    ) -> Result<Self> {
        let alarms = storage.load().await?;
        info!(count = alarms.len(), "alarm store loaded");
        let state = alarms
            .into_iter()
            .map(|alarm| (alarm.id.clone(), alarm))
            .collect();
        Ok(Self {
            storage,
            scheduler,
            state: Mutex::new(state),
        })
    }

    /// Create a new alarm: assign id and timestamps, persist, and (when
    /// enabled) schedule its notifications.
    pub async fn create(&self, draft: AlarmDraft) -> Result<Alarm> {
        let alarm = draft.into_alarm(AlarmId::new(), Utc::now());
        let mut state = self.state.lock().await;
        state.insert(alarm.id.clone(), alarm.clone());

        let persisted = self.persist(&state).await;
        let resynced = if alarm.enabled {
            self.scheduler.resync(&alarm).await
        } else {
            Ok(())
        };
        drop(state);

        info!(alarm_id = %alarm.id, time = %alarm.time, "alarm created");
        resynced?;
        persisted?;
        Ok(alarm)
    }

    /// Apply a partial update. Ordering: cancel old notifications, merge
    /// fields, bump `updated_at`, persist, then reschedule if the merged
    /// alarm is enabled — so old and new entries are never live together.
    pub async fn update(&self, id: &AlarmId, patch: AlarmPatch) -> Result<Alarm> {
        let mut state = self.state.lock().await;
        if !state.contains_key(id) {
            return Err(AlarmError::NotFound { id: id.to_string() });
        }

        self.scheduler.cancel_all(id).await?;

        // contains_key above guarantees the entry exists.
        let Some(alarm) = state.get_mut(id) else {
            return Err(AlarmError::NotFound { id: id.to_string() });
        };
        patch.apply(alarm);
        alarm.updated_at = Utc::now();
        let updated = alarm.clone();

        let persisted = self.persist(&state).await;
        let resynced = if updated.enabled {
            self.scheduler.resync(&updated).await
        } else {
            Ok(())
        };
        drop(state);

        info!(alarm_id = %id, enabled = updated.enabled, "alarm updated");
        resynced?;
        persisted?;
        Ok(updated)
    }

    /// Remove an alarm and its notifications. Returns whether it existed.
    pub async fn delete(&self, id: &AlarmId) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.contains_key(id) {
            return Ok(false);
        }

        self.scheduler.cancel_all(id).await?;
        state.remove(id);
        let persisted = self.persist(&state).await;
        drop(state);

        info!(alarm_id = %id, "alarm deleted");
        persisted?;
        Ok(true)
    }

    /// Flip `enabled`. Convenience wrapper over [`update`](Self::update).
    pub async fn toggle(&self, id: &AlarmId) -> Result<Alarm> {
        let enabled = self
            .state
            .lock()
            .await
            .get(id)
            .map(|alarm| alarm.enabled)
            .ok_or_else(|| AlarmError::NotFound { id: id.to_string() })?;
        self.update(id, AlarmPatch::enable(!enabled)).await
    }

    /// Owned snapshot of all alarms, ordered by creation time. Mutating
    /// the returned data does not affect store state.
    pub async fn list(&self) -> Vec<Alarm> {
        let state = self.state.lock().await;
        let mut alarms: Vec<Alarm> = state.values().cloned().collect();
        alarms.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        alarms
    }

    pub async fn get(&self, id: &AlarmId) -> Option<Alarm> {
        self.state.lock().await.get(id).cloned()
    }

    /// Reschedule every enabled alarm. Used at startup when the platform
    /// does not retain schedules across restarts (the in-process timer
    /// platform does not).
    pub async fn resync_all(&self) -> Result<()> {
        let alarms = self.list().await;
        let mut failed = 0usize;
        for alarm in alarms.iter().filter(|alarm| alarm.enabled) {
            if let Err(e) = self.scheduler.resync(alarm).await {
                warn!(alarm_id = %alarm.id, error = %e, "startup resync failed");
                failed += 1;
            }
        }
        if failed == 0 {
            Ok(())
        } else {
            Err(AlarmError::Platform(format!(
                "startup resync failed for {failed} alarm(s)"
            )))
        }
    }

    async fn persist(&self, state: &HashMap<AlarmId, Alarm>) -> Result<()> {
        let mut alarms: Vec<Alarm> = state.values().cloned().collect();
        alarms.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        if let Err(e) = self.storage.save(&alarms).await {
            warn!(error = %e, "alarm save failed; in-memory state retained");
            return Err(e);
        }
        Ok(())
    }
}
