use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use shared::{RoomId, ServerEvent, UserId};
use tokio::sync::Mutex;

use crate::auth::IdentityGate;
use crate::judge::Judge;
use crate::problems::ProblemBank;

pub mod lifecycle;
pub mod matchmaking;
pub mod session;
pub mod submission;

pub use session::{Connection, Membership, Room, RoomSummary, Tx, ROOM_CAPACITY};

/// Engine tunables, fixed at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on a single judging call.
    pub judge_timeout: Duration,
    /// How long finished rooms stay visible before the sweep retires them.
    pub retention: Duration,
    /// Pause between retention sweeps.
    pub sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            judge_timeout: Duration::from_secs(30),
            retention: Duration::from_secs(900),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// The room store: sole owner of all room state. Each room is mutated only
/// under its own lock; different rooms proceed in parallel.
pub struct AppState {
    pub gate: Arc<dyn IdentityGate>,
    pub judge: Arc<dyn Judge>,
    pub problems: Arc<dyn ProblemBank>,
    pub config: EngineConfig,
    pub connections: DashMap<UserId, Connection>,
    pub rooms: DashMap<RoomId, Arc<Mutex<Room>>>,
    /// Serializes auto-matchmaking's search-then-insert step.
    pub(crate) matchmaking: Mutex<()>,
    room_seq: AtomicU64,
}

impl AppState {
    pub fn new(
        gate: Arc<dyn IdentityGate>,
        judge: Arc<dyn Judge>,
        problems: Arc<dyn ProblemBank>,
        config: EngineConfig,
    ) -> Self {
        Self {
            gate,
            judge,
            problems,
            config,
            connections: DashMap::new(),
            rooms: DashMap::new(),
            matchmaking: Mutex::new(()),
            room_seq: AtomicU64::new(0),
        }
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.room_seq.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn room_handle(&self, room_id: &RoomId) -> Option<Arc<Mutex<Room>>> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    /// Delivers an event to every member's registered connection,
    /// best-effort. Callers hold the room lock, so members observe events
    /// for one room in the order its mutations were accepted.
    pub(crate) fn broadcast(&self, room: &Room, event: ServerEvent) {
        for member in &room.members {
            if let Some(conn) = self.connections.get(&member.user_id) {
                let _ = conn.tx.send(event.clone());
            }
        }
    }
}
