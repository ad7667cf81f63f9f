// Tick server: drives every active room on a fixed cadence and broadcasts
// each room's notifications to subscribers.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

use crate::error::Result;

use super::manager::AiManager;
use super::notification::Notification;
use super::room::{load_rooms, Room};

/// Messages published to transport and persistence subscribers.
#[derive(Clone, Serialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// One room's notifications for a tick, plus any players the room's
    /// creatures downed.
    #[serde(rename = "ai_update")]
    AiUpdate {
        room: String,
        updates: Vec<Notification>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        downed: Vec<u32>,
    },
}

/// Load every room in `dir` and register it with the manager.
/// Returns the shared room handles so the world layer can keep them.
pub fn register_rooms(manager: &AiManager, dir: &Path) -> Result<Vec<Arc<Mutex<Room>>>> {
    let rooms = load_rooms(dir)?;
    let mut handles = Vec::with_capacity(rooms.len());
    for room in rooms {
        let handle = Arc::new(Mutex::new(room));
        manager.add_room(Arc::clone(&handle))?;
        handles.push(handle);
    }
    tracing::info!(dir = %dir.display(), rooms = handles.len(), "Rooms loaded");
    Ok(handles)
}

/// Ticks every registered room and publishes the results as JSON.
pub struct TickServer {
    manager: Arc<AiManager>,
    broadcast_tx: broadcast::Sender<String>,
    running: Arc<AtomicBool>,
    tick_count: Arc<AtomicU64>,
    tick_interval: Duration,
    max_ticks: Option<u64>,
}

impl TickServer {
    pub fn new(manager: Arc<AiManager>, tick_interval: Duration, max_ticks: Option<u64>) -> Self {
        let (tx, _) = broadcast::channel(256);
        TickServer {
            manager,
            broadcast_tx: tx,
            running: Arc::new(AtomicBool::new(false)),
            tick_count: Arc::new(AtomicU64::new(0)),
            tick_interval,
            max_ticks,
        }
    }

    pub fn manager(&self) -> &Arc<AiManager> {
        &self.manager
    }

    /// Subscribe to tick output. Returns a receiver that yields JSON strings.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.broadcast_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ask a running loop to stop after the current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    /// Tick every room once. Rooms run concurrently on the blocking pool;
    /// each room with updates gets one message, published in room-name
    /// order. Returns the number of messages sent.
    pub async fn tick_all(&self) -> usize {
        let mut set = JoinSet::new();
        for name in self.manager.room_names() {
            let manager = Arc::clone(&self.manager);
            set.spawn_blocking(move || {
                let tick = manager.tick(&name);
                (name, tick)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(pair) => results.push(pair),
                Err(e) => tracing::error!("Room tick task failed: {e}"),
            }
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));

        let mut sent = 0;
        for (room, tick) in results {
            if tick.is_empty() {
                continue;
            }
            let msg = ServerMessage::AiUpdate {
                room,
                updates: tick.updates,
                downed: tick.downed,
            };
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    // No subscribers is not an error
                    let _ = self.broadcast_tx.send(json);
                    sent += 1;
                }
                Err(e) => tracing::error!("Failed to serialize room update: {e}"),
            }
        }
        self.tick_count.fetch_add(1, Ordering::Relaxed);
        sent
    }

    /// Tick on a fixed interval until stopped or `max_ticks` is reached.
    pub async fn run(&self) {
        self.running.store(true, Ordering::Relaxed);
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tracing::info!(
            rooms = self.manager.len(),
            interval_ms = self.tick_interval.as_millis() as u64,
            "Tick loop started"
        );

        while self.is_running() {
            interval.tick().await;
            if !self.is_running() {
                break;
            }
            self.tick_all().await;
            if self.max_ticks.is_some_and(|max| self.tick_count() >= max) {
                break;
            }
        }

        self.running.store(false, Ordering::Relaxed);
        tracing::info!(ticks = self.tick_count(), "Tick loop stopped");
    }
}
