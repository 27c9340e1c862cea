use std::sync::Arc;
use std::time::Instant;

use shared::{RoomId, RoomStatus, ServerEvent, UserId};
use tokio::sync::Mutex;

use crate::auth::Identity;
use crate::errors::RoomError;
use crate::room_manager::{AppState, Connection, Room, Tx};

impl AppState {
    pub fn register_connection(&self, identity: &Identity, tx: Tx) {
        tracing::info!(user_id = %identity.user_id, username = %identity.username, "Connection registered");
        // A reconnect replaces the previous registration.
        self.connections.insert(
            identity.user_id.clone(),
            Connection {
                tx,
                username: identity.username.clone(),
            },
        );
    }

    pub async fn start_match(&self, identity: &Identity, room_id: &RoomId) -> Result<(), RoomError> {
        let handle = self
            .room_handle(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        let mut room = handle.lock().await;
        if !room.is_active {
            return Err(RoomError::RoomNotFound(room_id.clone()));
        }
        let is_creator = room
            .member(&identity.user_id)
            .map(|m| m.is_creator)
            .unwrap_or(false);
        if !is_creator {
            return Err(RoomError::NotCreator);
        }
        if room.status != RoomStatus::Waiting {
            return Err(RoomError::WrongStatus {
                room_id: room_id.clone(),
                expected: RoomStatus::Waiting,
                actual: room.status,
            });
        }

        room.status = RoomStatus::Live;
        room.touch();
        tracing::info!(room_id = %room.room_id, "Match started");
        self.broadcast(
            &room,
            ServerEvent::MatchStart {
                room_id: room.room_id.clone(),
                problem_id: room.problem_id.clone(),
                members: room.member_views(),
            },
        );
        Ok(())
    }

    /// Explicit leave. Idempotent: leaving a room you are not in, or one
    /// that no longer exists, does nothing.
    pub async fn leave_room(&self, identity: &Identity, room_id: &RoomId) {
        if let Some(handle) = self.room_handle(room_id) {
            let mut room = handle.lock().await;
            self.remove_membership(&mut room, &identity.user_id);
        }
    }

    /// Implicit leave from every room the user occupies. A duplicate
    /// disconnect signal finds no membership and is a no-op.
    pub async fn disconnect(&self, user_id: &UserId) {
        if let Some((_, conn)) = self.connections.remove(user_id) {
            tracing::info!(user_id = %user_id, username = %conn.username, "Connection removed");
        }
        let handles: Vec<Arc<Mutex<Room>>> =
            self.rooms.iter().map(|entry| entry.value().clone()).collect();
        for handle in handles {
            let mut room = handle.lock().await;
            self.remove_membership(&mut room, user_id);
        }
    }

    /// Operator trigger for ending a live match early.
    pub async fn force_finish(&self, room_id: &RoomId) -> Result<(), RoomError> {
        let handle = self
            .room_handle(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        let mut room = handle.lock().await;
        if !room.is_active {
            return Err(RoomError::RoomNotFound(room_id.clone()));
        }
        if room.status != RoomStatus::Live {
            return Err(RoomError::WrongStatus {
                room_id: room_id.clone(),
                expected: RoomStatus::Live,
                actual: room.status,
            });
        }
        self.finish_room(&mut room);
        Ok(())
    }

    /// Shared by explicit leave and disconnect cleanup. Caller holds the lock.
    fn remove_membership(&self, room: &mut Room, user_id: &UserId) {
        if !room.is_active || !room.remove_member(user_id) {
            return;
        }
        room.touch();
        tracing::info!(room_id = %room.room_id, user_id = %user_id, "User left room");

        if room.members.is_empty() {
            room.is_active = false;
            tracing::info!(room_id = %room.room_id, "Room emptied, deactivated");
            return;
        }

        self.broadcast(
            room,
            ServerEvent::RoomUpdate {
                room_id: room.room_id.clone(),
                version: room.version,
                members: room.member_views(),
            },
        );

        // Removing the last pending member can complete a live match.
        if room.status == RoomStatus::Live && room.all_submitted() {
            self.finish_room(room);
        }
    }

    /// Marks the room finished and announces it, all under the caller's
    /// lock: there is no window where every member reads submitted while
    /// the status still reads live.
    pub(crate) fn finish_room(&self, room: &mut Room) {
        room.status = RoomStatus::Finished;
        room.finished_at = Some(Instant::now());
        room.touch();
        tracing::info!(room_id = %room.room_id, "Match finished");
        self.broadcast(
            room,
            ServerEvent::MatchFinished {
                room_id: room.room_id.clone(),
                members: room.member_views(),
            },
        );
    }

    pub fn spawn_retention_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.sweep_interval);
            loop {
                interval.tick().await;
                self.sweep_rooms().await;
            }
        });
    }

    /// Retires rooms that stopped accepting mutation: emptied ones right
    /// away, finished ones once the retention window elapses.
    pub async fn sweep_rooms(&self) {
        let entries: Vec<(RoomId, Arc<Mutex<Room>>)> = self
            .rooms
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (room_id, handle) in entries {
            {
                let mut room = handle.lock().await;
                if room.is_active {
                    let expired = room.status == RoomStatus::Finished
                        && room
                            .finished_at
                            .map(|at| at.elapsed() >= self.config.retention)
                            .unwrap_or(false);
                    if !expired {
                        continue;
                    }
                    room.is_active = false;
                }
            }
            self.rooms.remove(&room_id);
            tracing::info!(room_id = %room_id, "Room retired");
        }
    }
}
