use std::sync::Arc;

use shared::{ProblemId, RoomId, RoomStatus, ServerEvent};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::RoomError;
use crate::room_manager::{AppState, Membership, Room, RoomSummary};

impl AppState {
    pub async fn create_room(&self, identity: &Identity) -> Result<RoomSummary, RoomError> {
        let problem_id = self.problems.pick_random().await?;
        let summary = self.insert_room(identity, problem_id);
        tracing::info!(room_id = %summary.room_id, user_id = %identity.user_id, "Room created");
        Ok(summary)
    }

    pub async fn join_room(
        &self,
        identity: &Identity,
        room_id: Option<RoomId>,
    ) -> Result<RoomSummary, RoomError> {
        match room_id {
            Some(room_id) => self.join_explicit(identity, room_id).await,
            None => self.auto_match(identity).await,
        }
    }

    fn insert_room(&self, identity: &Identity, problem_id: ProblemId) -> RoomSummary {
        let room_id = RoomId(Uuid::new_v4().to_string());
        let room = Room::new(
            room_id.clone(),
            problem_id,
            Membership::new(identity, true),
            self.next_seq(),
        );
        let summary = room.summary();
        self.rooms.insert(room_id, Arc::new(Mutex::new(room)));
        summary
    }

    async fn join_explicit(
        &self,
        identity: &Identity,
        room_id: RoomId,
    ) -> Result<RoomSummary, RoomError> {
        let handle = self
            .room_handle(&room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        let mut room = handle.lock().await;
        self.join_locked(identity, &mut room)
    }

    /// Membership insert under the room lock. Shared by the explicit and
    /// auto-match paths.
    fn join_locked(&self, identity: &Identity, room: &mut Room) -> Result<RoomSummary, RoomError> {
        if !room.is_active {
            return Err(RoomError::RoomNotFound(room.room_id.clone()));
        }
        // A member re-joining gets the current snapshot back, nothing changes.
        if room.contains(&identity.user_id) {
            return Ok(room.summary());
        }
        if room.status != RoomStatus::Waiting {
            return Err(RoomError::WrongStatus {
                room_id: room.room_id.clone(),
                expected: RoomStatus::Waiting,
                actual: room.status,
            });
        }
        if !room.has_space() {
            return Err(RoomError::RoomFull(room.room_id.clone()));
        }

        room.members.push(Membership::new(identity, false));
        room.touch();
        tracing::info!(room_id = %room.room_id, user_id = %identity.user_id, "User joined room");
        self.broadcast(
            room,
            ServerEvent::RoomUpdate {
                room_id: room.room_id.clone(),
                version: room.version,
                members: room.member_views(),
            },
        );
        Ok(room.summary())
    }

    /// Rating-banded matchmaking: place the requester into the oldest open
    /// room holding a comparable member, or open a fresh room for them.
    async fn auto_match(&self, identity: &Identity) -> Result<RoomSummary, RoomError> {
        // Search and insert happen under one lock so two concurrent requests
        // cannot double-book the last slot of a near-full room.
        let _guard = self.matchmaking.lock().await;

        let handles: Vec<Arc<Mutex<Room>>> =
            self.rooms.iter().map(|entry| entry.value().clone()).collect();

        let mut candidates = Vec::new();
        for handle in handles {
            let room = handle.lock().await;
            if room.is_active
                && room.status == RoomStatus::Waiting
                && room.has_space()
                && room.within_band(identity.rating)
            {
                candidates.push((room.seq, handle.clone()));
            }
        }
        candidates.sort_by_key(|(seq, _)| *seq);

        for (_, handle) in candidates {
            let mut room = handle.lock().await;
            if let Ok(summary) = self.join_locked(identity, &mut room) {
                return Ok(summary);
            }
        }

        let problem_id = self.problems.pick_random().await?;
        let summary = self.insert_room(identity, problem_id);
        tracing::info!(
            room_id = %summary.room_id,
            user_id = %identity.user_id,
            rating = identity.rating,
            "No compatible room, created a new one"
        );
        Ok(summary)
    }
}
