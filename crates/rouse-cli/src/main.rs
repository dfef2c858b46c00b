use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};

use rouse_alarms::{
    AlarmStore, FiredAlarm, NotificationScheduler, SnoozeManager, SqliteStorage, TimerPlatform,
};
use rouse_audio::SoundPlaybackController;
use rouse_core::{
    config::RouseConfig, Alarm, AlarmCategory, AlarmDraft, AlarmId, AlarmSound, ClockTime, Weekday,
};

mod term;
use term::TerminalAudioBackend;

#[derive(Parser)]
#[command(name = "rouse", about = "Alarm scheduling for study schedules", version)]
struct Cli {
    /// Config file path (default: ROUSE_CONFIG env, then ~/.rouse/rouse.toml)
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an alarm
    Add {
        /// Time of day, HH:MM
        time: ClockTime,
        /// Title shown on the notification
        #[arg(long, default_value = "Alarm")]
        title: String,
        /// Notification body text
        #[arg(long, default_value = "")]
        description: String,
        /// Repeat weekdays (e.g. mon,wed,fri); omit for a one-shot alarm
        #[arg(long, value_delimiter = ',')]
        days: Vec<Weekday>,
        /// Sound to play (classic, digital, gentle, nature, urgent)
        #[arg(long)]
        sound: Option<AlarmSound>,
        /// Category (study, exam, break, personal)
        #[arg(long)]
        category: Option<AlarmCategory>,
        /// Create the alarm disabled
        #[arg(long)]
        disabled: bool,
        /// Disable snooze for this alarm
        #[arg(long)]
        no_snooze: bool,
        /// Snooze deferral in minutes
        #[arg(long)]
        snooze_minutes: Option<u32>,
    },
    /// List alarms
    List,
    /// Flip an alarm's enabled state
    Toggle { id: String },
    /// Delete an alarm
    Remove { id: String },
    /// Snooze an alarm as if its notification just fired
    Snooze { id: String },
    /// Run in the foreground, firing alarms via in-process timers
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rouse=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // load config: explicit flag > ROUSE_CONFIG env > ~/.rouse/rouse.toml
    let config_path = cli.config.or_else(|| std::env::var("ROUSE_CONFIG").ok());
    let config = RouseConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("config load failed ({e}), using defaults");
        RouseConfig::default()
    });

    ensure_parent_dir(&config.database.path);
    info!(path = %config.database.path, "opening alarm database");
    let storage = Arc::new(SqliteStorage::open(&config.database.path)?);

    let (fired_tx, fired_rx) = mpsc::channel::<FiredAlarm>(256);
    let platform = Arc::new(TimerPlatform::new(fired_tx));
    let scheduler = Arc::new(NotificationScheduler::new(platform));
    let store = Arc::new(AlarmStore::open(storage, scheduler.clone()).await?);

    match cli.command {
        Command::Add {
            time,
            title,
            description,
            days,
            sound,
            category,
            disabled,
            no_snooze,
            snooze_minutes,
        } => {
            let draft = AlarmDraft {
                time,
                enabled: !disabled,
                repeat_days: days.into_iter().collect(),
                sound: sound.unwrap_or(config.alarms.sound),
                snooze_enabled: !no_snooze,
                snooze_minutes: snooze_minutes.unwrap_or(config.alarms.snooze_minutes),
                vibration_enabled: true,
                vibration: Default::default(),
                category: category.unwrap_or(config.alarms.category),
                title,
                description,
            };
            let alarm = store.create(draft).await?;
            println!("created {}", alarm.id);
            print_alarm(&alarm);
        }
        Command::List => {
            let alarms = store.list().await;
            if alarms.is_empty() {
                println!("no alarms");
            }
            for alarm in alarms {
                print_alarm(&alarm);
            }
        }
        Command::Toggle { id } => {
            let alarm = store.toggle(&AlarmId::from(id)).await?;
            println!(
                "{} is now {}",
                alarm.id,
                if alarm.enabled { "on" } else { "off" }
            );
        }
        Command::Remove { id } => {
            if store.delete(&AlarmId::from(id.as_str())).await? {
                println!("removed {id}");
            } else {
                println!("no alarm with id {id}");
            }
        }
        Command::Snooze { id } => {
            let playback = Arc::new(SoundPlaybackController::new(Arc::new(
                TerminalAudioBackend::default(),
            )));
            let snooze = SnoozeManager::new(store.clone(), scheduler.clone(), playback);
            snooze
                .snooze(&AlarmId::from(id.as_str()), chrono::Utc::now())
                .await?;
            println!("snoozed {id}");
        }
        Command::Run => run(store, fired_rx).await,
    }

    Ok(())
}

/// Foreground service loop: reschedule everything, then deliver fired
/// alarms until ctrl-c.
async fn run(store: Arc<AlarmStore>, mut fired_rx: mpsc::Receiver<FiredAlarm>) {
    let playback = Arc::new(SoundPlaybackController::new(Arc::new(
        TerminalAudioBackend::default(),
    )));

    // In-process timers do not survive restarts; rebuild them from the store.
    if let Err(e) = store.resync_all().await {
        warn!("startup resync incomplete: {e}");
    }
    let enabled = store.list().await.iter().filter(|a| a.enabled).count();
    info!(enabled, "alarm service running; ctrl-c to exit");

    loop {
        tokio::select! {
            maybe_fired = fired_rx.recv() => {
                let Some(fired) = maybe_fired else { break };
                let when = fired.fired_at.format("%H:%M:%S");
                let tag = if fired.payload.snooze { " (snoozed)" } else { "" };
                println!("⏰ {when}  {}{tag}", fired.payload.title);
                if let Err(e) = playback.play(fired.payload.sound).await {
                    warn!(alarm_id = %fired.payload.alarm_id, "could not play sound: {e}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }
    playback.stop().await;
}

fn print_alarm(alarm: &Alarm) {
    let days = if alarm.repeat_days.is_empty() {
        "once".to_string()
    } else {
        alarm
            .repeat_days
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };
    println!(
        "{}  {}  [{}]  {}  ({}, {})",
        alarm.id,
        alarm.time,
        if alarm.enabled { "on " } else { "off" },
        alarm.title,
        alarm.category,
        days
    );
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
}
