use async_trait::async_trait;
use huddle_exec::{CorrelationKey, ExecutionResult, ReportSink, StatusKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Reports buffered per room before slow consoles start lagging
const ROOM_CAPACITY: usize = 32;

pub const CODE_OUTPUT_EVENT: &str = "codeOutput";

/// Message pushed to every console in a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    pub event: String,
    pub status: StatusKind,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_kb: Option<u64>,
}

impl RoomEvent {
    pub fn code_output(result: &ExecutionResult) -> Self {
        Self {
            event: CODE_OUTPUT_EVENT.to_string(),
            status: result.status,
            output: result.report.clone(),
            timing_ms: result.timing_ms,
            memory_kb: result.memory_kb,
        }
    }
}

/// One broadcast channel per room, created on first use
#[derive(Default)]
pub struct RoomHub {
    rooms: RwLock<HashMap<CorrelationKey, broadcast::Sender<RoomEvent>>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, room: &CorrelationKey) -> broadcast::Receiver<RoomEvent> {
        if let Some(sender) = self.rooms.read().await.get(room) {
            return sender.subscribe();
        }
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room.clone())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Sends `event` to every console in `room` and returns how many got it.
    /// Rooms without listeners are dropped.
    pub async fn broadcast(&self, room: &CorrelationKey, event: RoomEvent) -> usize {
        let delivered = match self.rooms.read().await.get(room) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        };
        if delivered == 0 {
            self.prune(room).await;
        }
        delivered
    }

    /// Drops `room` once its last console has gone
    pub async fn prune(&self, room: &CorrelationKey) -> bool {
        let mut rooms = self.rooms.write().await;
        let idle = rooms
            .get(room)
            .is_some_and(|sender| sender.receiver_count() == 0);
        if idle {
            rooms.remove(room);
            debug!("Room {} has no consoles left", room);
        }
        idle
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[async_trait]
impl ReportSink for RoomHub {
    async fn publish(
        &self,
        key: &CorrelationKey,
        result: &ExecutionResult,
    ) -> Result<(), huddle_exec::Error> {
        let delivered = self.broadcast(key, RoomEvent::code_output(result)).await;
        debug!("Report for room {} delivered to {} consoles", key, delivered);
        Ok(())
    }
}
