// End-to-end lifecycle tests over the store/scheduler/snooze stack,
// with a recording platform fake and injectable storage failures.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;

use rouse_alarms::{
    AlarmError, AlarmStore, MemoryStorage, NotificationHandle, NotificationPayload,
    NotificationPlatform, NotificationScheduler, NotificationTrigger, SnoozeManager,
};
use rouse_audio::{AudioBackend, AudioError, PlaybackHandle, SoundPlaybackController};
use rouse_core::{AlarmDraft, AlarmId, AlarmPatch, ClockTime, Weekday};

#[derive(Default)]
struct RecordingPlatform {
    next: AtomicU64,
    live: StdMutex<HashMap<NotificationHandle, (NotificationTrigger, NotificationPayload)>>,
    cancelled: StdMutex<Vec<NotificationHandle>>,
    fail_days: StdMutex<BTreeSet<Weekday>>,
}

impl RecordingPlatform {
    fn live_handles(&self) -> Vec<NotificationHandle> {
        self.live.lock().unwrap().keys().cloned().collect()
    }

    fn live_payloads(&self) -> Vec<NotificationPayload> {
        self.live
            .lock()
            .unwrap()
            .values()
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    fn live_triggers(&self) -> Vec<NotificationTrigger> {
        self.live
            .lock()
            .unwrap()
            .values()
            .map(|(trigger, _)| trigger.clone())
            .collect()
    }

    fn cancelled_count(&self) -> usize {
        self.cancelled.lock().unwrap().len()
    }

    fn fail_day(&self, day: Weekday) {
        self.fail_days.lock().unwrap().insert(day);
    }
}

#[async_trait]
impl NotificationPlatform for RecordingPlatform {
    async fn schedule(
        &self,
        trigger: NotificationTrigger,
        payload: NotificationPayload,
    ) -> Result<NotificationHandle, AlarmError> {
        if let NotificationTrigger::Weekly { day, .. } = &trigger {
            if self.fail_days.lock().unwrap().contains(day) {
                return Err(AlarmError::Platform(format!("injected failure for {day}")));
            }
        }
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = NotificationHandle(format!("n{n}"));
        self.live
            .lock()
            .unwrap()
            .insert(handle.clone(), (trigger, payload));
        Ok(handle)
    }

    async fn cancel(&self, handle: &NotificationHandle) -> Result<(), AlarmError> {
        // idempotent: removing an unknown handle is still success
        self.live.lock().unwrap().remove(handle);
        self.cancelled.lock().unwrap().push(handle.clone());
        Ok(())
    }
}

#[derive(Default)]
struct SilentBackend {
    next: AtomicU64,
    stops: AtomicU64,
}

#[async_trait]
impl AudioBackend for SilentBackend {
    async fn start(&self, _asset: &str) -> Result<PlaybackHandle, AudioError> {
        Ok(PlaybackHandle(self.next.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn stop(&self, _handle: PlaybackHandle) -> Result<(), AudioError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Rig {
    platform: Arc<RecordingPlatform>,
    storage: Arc<MemoryStorage>,
    scheduler: Arc<NotificationScheduler>,
    store: Arc<AlarmStore>,
}

async fn rig() -> Rig {
    let platform = Arc::new(RecordingPlatform::default());
    let storage = Arc::new(MemoryStorage::new());
    let scheduler = Arc::new(NotificationScheduler::new(platform.clone()));
    let store = Arc::new(
        AlarmStore::open(storage.clone(), scheduler.clone())
            .await
            .unwrap(),
    );
    Rig {
        platform,
        storage,
        scheduler,
        store,
    }
}

fn draft(time: (u8, u8), days: &[Weekday], enabled: bool) -> AlarmDraft {
    AlarmDraft {
        time: ClockTime::new(time.0, time.1).unwrap(),
        enabled,
        repeat_days: days.iter().copied().collect(),
        sound: Default::default(),
        snooze_enabled: true,
        snooze_minutes: 10,
        vibration_enabled: true,
        vibration: Default::default(),
        category: Default::default(),
        title: "test alarm".to_string(),
        description: String::new(),
    }
}

#[tokio::test]
async fn create_one_shot_schedules_single_future_entry() {
    let rig = rig().await;
    let before = Utc::now();
    let alarm = rig.store.create(draft((7, 0), &[], true)).await.unwrap();

    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 1);
    let triggers = rig.platform.live_triggers();
    assert_eq!(triggers.len(), 1);
    match &triggers[0] {
        NotificationTrigger::OneShot { at } => assert!(*at > before),
        other => panic!("expected one-shot trigger, got {other:?}"),
    }
}

#[tokio::test]
async fn create_repeating_schedules_one_entry_per_day() {
    let rig = rig().await;
    let days = [Weekday::Monday, Weekday::Wednesday, Weekday::Friday];
    let alarm = rig.store.create(draft((7, 0), &days, true)).await.unwrap();

    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 3);
    let mut scheduled_days: Vec<Weekday> = rig
        .platform
        .live_triggers()
        .into_iter()
        .map(|t| match t {
            NotificationTrigger::Weekly { day, .. } => day,
            other => panic!("expected weekly trigger, got {other:?}"),
        })
        .collect();
    scheduled_days.sort();
    assert_eq!(scheduled_days, days);

    // each payload names the repeat day that produced it
    for payload in rig.platform.live_payloads() {
        assert!(payload.repeat_day.is_some());
        assert!(!payload.snooze);
        assert_eq!(payload.alarm_id, alarm.id);
    }
}

#[tokio::test]
async fn create_disabled_schedules_nothing() {
    let rig = rig().await;
    let alarm = rig
        .store
        .create(draft((7, 0), &[Weekday::Monday], false))
        .await
        .unwrap();
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 0);
    assert!(rig.platform.live_handles().is_empty());
}

#[tokio::test]
async fn update_replaces_entries_without_mixing_old_and_new() {
    let rig = rig().await;
    let days = [Weekday::Monday, Weekday::Tuesday];
    let alarm = rig.store.create(draft((7, 0), &days, true)).await.unwrap();
    let old_handles = rig.platform.live_handles();

    let patch = AlarmPatch {
        time: Some(ClockTime::new(9, 30).unwrap()),
        ..AlarmPatch::default()
    };
    rig.store.update(&alarm.id, patch).await.unwrap();

    // every old handle is gone from the platform
    let new_handles = rig.platform.live_handles();
    for old in &old_handles {
        assert!(!new_handles.contains(old), "stale handle {old} still live");
    }
    // the live set matches a fresh resync of the final state
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, days.len());
    for trigger in rig.platform.live_triggers() {
        match trigger {
            NotificationTrigger::Weekly { hour, minute, .. } => {
                assert_eq!((hour, minute), (9, 30));
            }
            other => panic!("expected weekly trigger, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn update_bumps_updated_at() {
    let rig = rig().await;
    let alarm = rig.store.create(draft((7, 0), &[], true)).await.unwrap();
    let updated = rig
        .store
        .update(&alarm.id, AlarmPatch::enable(true))
        .await
        .unwrap();
    assert!(updated.updated_at >= updated.created_at);
    assert!(updated.updated_at >= alarm.updated_at);
}

#[tokio::test]
async fn update_unknown_id_is_not_found_with_no_side_effects() {
    let rig = rig().await;
    let err = rig
        .store
        .update(&AlarmId::from("missing"), AlarmPatch::enable(false))
        .await
        .unwrap_err();
    assert!(matches!(err, AlarmError::NotFound { .. }));
    assert_eq!(rig.platform.cancelled_count(), 0);
    assert!(rig.storage.saved().is_empty());
}

#[tokio::test]
async fn disabling_clears_the_live_set() {
    let rig = rig().await;
    let days = [Weekday::Monday, Weekday::Wednesday, Weekday::Friday];
    let alarm = rig.store.create(draft((6, 15), &days, true)).await.unwrap();
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 3);

    rig.store
        .update(&alarm.id, AlarmPatch::enable(false))
        .await
        .unwrap();
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 0);
    assert!(rig.platform.live_handles().is_empty());
}

#[tokio::test]
async fn toggle_round_trip_restores_schedule() {
    let rig = rig().await;
    let alarm = rig
        .store
        .create(draft((6, 15), &[Weekday::Sunday], true))
        .await
        .unwrap();

    let off = rig.store.toggle(&alarm.id).await.unwrap();
    assert!(!off.enabled);
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 0);

    let on = rig.store.toggle(&alarm.id).await.unwrap();
    assert!(on.enabled);
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 1);
}

#[tokio::test]
async fn delete_reports_existence_and_clears_entries() {
    let rig = rig().await;
    let alarm = rig
        .store
        .create(draft((8, 0), &[Weekday::Tuesday], true))
        .await
        .unwrap();

    assert!(rig.store.delete(&alarm.id).await.unwrap());
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 0);
    assert!(rig.platform.live_handles().is_empty());
    assert!(rig.store.get(&alarm.id).await.is_none());

    // second delete: the alarm no longer exists, not an error
    assert!(!rig.store.delete(&alarm.id).await.unwrap());
}

#[tokio::test]
async fn cancel_all_twice_is_idempotent() {
    let rig = rig().await;
    let alarm = rig
        .store
        .create(draft((8, 0), &[Weekday::Monday, Weekday::Tuesday], true))
        .await
        .unwrap();

    rig.scheduler.cancel_all(&alarm.id).await.unwrap();
    let after_first = rig.platform.cancelled_count();
    assert_eq!(after_first, 2);
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 0);

    // second call: same end state, no further platform traffic, no error
    rig.scheduler.cancel_all(&alarm.id).await.unwrap();
    assert_eq!(rig.platform.cancelled_count(), after_first);
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 0);
}

#[tokio::test]
async fn partial_schedule_failure_is_reported_and_keeps_other_days() {
    let rig = rig().await;
    rig.platform.fail_day(Weekday::Tuesday);

    let days = [Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday];
    let err = rig
        .store
        .create(draft((7, 0), &days, true))
        .await
        .unwrap_err();
    assert!(matches!(err, AlarmError::Platform(_)));

    // the alarm exists and the two healthy days are live
    let alarms = rig.store.list().await;
    assert_eq!(alarms.len(), 1);
    assert_eq!(rig.scheduler.live_count(&alarms[0].id).await, 2);
}

#[tokio::test]
async fn persistence_failure_is_surfaced_but_operation_completes() {
    let rig = rig().await;
    rig.storage.fail_saves(true);

    let err = rig.store.create(draft((7, 0), &[], true)).await.unwrap_err();
    assert!(matches!(err, AlarmError::Persistence(_)));

    // log-and-continue: the alarm is live in memory with its notification
    let alarms = rig.store.list().await;
    assert_eq!(alarms.len(), 1);
    assert_eq!(rig.scheduler.live_count(&alarms[0].id).await, 1);
}

#[tokio::test]
async fn store_reopens_from_persisted_state() {
    let rig = rig().await;
    rig.store
        .create(draft((7, 0), &[Weekday::Monday], true))
        .await
        .unwrap();
    rig.store.create(draft((22, 30), &[], false)).await.unwrap();

    let scheduler2 = Arc::new(NotificationScheduler::new(Arc::new(
        RecordingPlatform::default(),
    )));
    let reopened = AlarmStore::open(rig.storage.clone(), scheduler2)
        .await
        .unwrap();
    let alarms = reopened.list().await;
    assert_eq!(alarms.len(), 2);
    assert_eq!(alarms[0].time, ClockTime::new(7, 0).unwrap());
}

#[tokio::test]
async fn resync_all_schedules_only_enabled_alarms() {
    let rig = rig().await;
    let on = rig
        .store
        .create(draft((7, 0), &[Weekday::Monday, Weekday::Friday], true))
        .await
        .unwrap();
    let off = rig.store.create(draft((9, 0), &[], false)).await.unwrap();

    // simulate a platform restart: nothing live anymore
    rig.scheduler.cancel_all(&on.id).await.unwrap();
    assert!(rig.platform.live_handles().is_empty());

    rig.store.resync_all().await.unwrap();
    assert_eq!(rig.scheduler.live_count(&on.id).await, 2);
    assert_eq!(rig.scheduler.live_count(&off.id).await, 0);
}

#[tokio::test]
async fn snooze_defers_once_and_silences_playback() {
    let rig = rig().await;
    let backend = Arc::new(SilentBackend::default());
    let playback = Arc::new(SoundPlaybackController::new(backend.clone()));
    let snooze = SnoozeManager::new(rig.store.clone(), rig.scheduler.clone(), playback.clone());

    let alarm = rig
        .store
        .create(draft((7, 0), &[Weekday::Monday], true))
        .await
        .unwrap();
    playback.play(alarm.sound).await.unwrap();

    let now = Utc::now();
    snooze.snooze(&alarm.id, now).await.unwrap();

    // one extra entry, tagged snooze, at now + snooze_minutes
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 2);
    let snoozed: Vec<_> = rig
        .platform
        .live_payloads()
        .into_iter()
        .filter(|p| p.snooze)
        .collect();
    assert_eq!(snoozed.len(), 1);
    let entries = rig.scheduler.live_entries(&alarm.id).await;
    let deferred = entries.iter().find(|e| e.is_snooze()).unwrap();
    assert_eq!(
        deferred.scheduled_for,
        now + chrono::Duration::minutes(i64::from(alarm.snooze_minutes))
    );

    // sound is stopped
    assert!(!playback.is_playing().await);
    assert_eq!(backend.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn snooze_disabled_is_a_silent_noop() {
    let rig = rig().await;
    let playback = Arc::new(SoundPlaybackController::new(Arc::new(
        SilentBackend::default(),
    )));
    let snooze = SnoozeManager::new(rig.store.clone(), rig.scheduler.clone(), playback);

    let mut draft = draft((7, 0), &[], true);
    draft.snooze_enabled = false;
    let alarm = rig.store.create(draft).await.unwrap();
    let before = rig.scheduler.live_count(&alarm.id).await;

    snooze.snooze(&alarm.id, Utc::now()).await.unwrap();
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, before);
}

#[tokio::test]
async fn snooze_unknown_alarm_is_a_silent_noop() {
    let rig = rig().await;
    let playback = Arc::new(SoundPlaybackController::new(Arc::new(
        SilentBackend::default(),
    )));
    let snooze = SnoozeManager::new(rig.store.clone(), rig.scheduler.clone(), playback);

    snooze
        .snooze(&AlarmId::from("missing"), Utc::now())
        .await
        .unwrap();
    assert!(rig.platform.live_handles().is_empty());
}

#[tokio::test]
async fn resync_clears_pending_snoozes_too() {
    let rig = rig().await;
    let playback = Arc::new(SoundPlaybackController::new(Arc::new(
        SilentBackend::default(),
    )));
    let snooze = SnoozeManager::new(rig.store.clone(), rig.scheduler.clone(), playback);

    let alarm = rig.store.create(draft((7, 0), &[], true)).await.unwrap();
    snooze.snooze(&alarm.id, Utc::now()).await.unwrap();
    assert_eq!(rig.scheduler.live_count(&alarm.id).await, 2);

    // reconfiguring the alarm drops the pending snooze along with the rest
    rig.store
        .update(&alarm.id, AlarmPatch::enable(true))
        .await
        .unwrap();
    let entries = rig.scheduler.live_entries(&alarm.id).await;
    assert_eq!(entries.len(), 1);
    assert!(entries.iter().all(|e| !e.is_snooze()));
}
