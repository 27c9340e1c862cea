use std::time::{Instant, SystemTime};

use shared::{MemberView, ProblemId, RoomId, RoomStatus, ServerEvent, SubmissionStatus, UserId};
use tokio::sync::mpsc;

use crate::auth::Identity;

pub type Tx = mpsc::UnboundedSender<ServerEvent>;

/// Most members a single room will hold.
pub const ROOM_CAPACITY: usize = 10;

/// Inclusive rating window used by auto-matchmaking.
pub const RATING_BAND: i32 = 200;

/// A live connection registered with the engine.
pub struct Connection {
    pub tx: Tx,
    pub username: String,
}

/// One user's participation in a room.
#[derive(Debug, Clone)]
pub struct Membership {
    pub user_id: UserId,
    pub username: String,
    /// Rating at join time, not live-updated.
    pub rating_snapshot: i32,
    pub is_creator: bool,
    pub score: u32,
    pub submission_status: SubmissionStatus,
    pub submission_time: Option<SystemTime>,
}

impl Membership {
    pub fn new(identity: &Identity, is_creator: bool) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            username: identity.username.clone(),
            rating_snapshot: identity.rating,
            is_creator,
            score: 0,
            submission_status: SubmissionStatus::Pending,
            submission_time: None,
        }
    }

    pub fn view(&self) -> MemberView {
        MemberView {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            rating: self.rating_snapshot,
            is_creator: self.is_creator,
            score: self.score,
            submission_status: self.submission_status,
        }
    }
}

/// What create/join hand back to the caller.
#[derive(Debug, Clone)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub problem_id: ProblemId,
    pub members: Vec<MemberView>,
}

/// One match instance: a fixed problem plus a bounded set of competing
/// members. All mutation happens under the room's lock in the registry.
pub struct Room {
    pub room_id: RoomId,
    pub problem_id: ProblemId,
    pub status: RoomStatus,
    /// False once the room is torn down; inactive rooms accept no mutation
    /// and report as not found.
    pub is_active: bool,
    pub members: Vec<Membership>,
    /// Bumped on every accepted mutation.
    pub version: u64,
    /// Creation order, the deterministic matchmaking tie-break.
    pub seq: u64,
    pub finished_at: Option<Instant>,
}

impl Room {
    pub fn new(room_id: RoomId, problem_id: ProblemId, creator: Membership, seq: u64) -> Self {
        Self {
            room_id,
            problem_id,
            status: RoomStatus::Waiting,
            is_active: true,
            members: vec![creator],
            version: 0,
            seq,
            finished_at: None,
        }
    }

    pub fn member(&self, user_id: &UserId) -> Option<&Membership> {
        self.members.iter().find(|m| &m.user_id == user_id)
    }

    pub fn member_mut(&mut self, user_id: &UserId) -> Option<&mut Membership> {
        self.members.iter_mut().find(|m| &m.user_id == user_id)
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.member(user_id).is_some()
    }

    pub fn has_space(&self) -> bool {
        self.members.len() < ROOM_CAPACITY
    }

    /// True if any member's rating snapshot is within the matchmaking band
    /// of the given rating.
    pub fn within_band(&self, rating: i32) -> bool {
        self.members
            .iter()
            .any(|m| (m.rating_snapshot - rating).abs() <= RATING_BAND)
    }

    /// Removes the membership if present. Returns whether anything changed.
    pub fn remove_member(&mut self, user_id: &UserId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| &m.user_id != user_id);
        self.members.len() != before
    }

    pub fn all_submitted(&self) -> bool {
        self.members
            .iter()
            .all(|m| m.submission_status == SubmissionStatus::Submitted)
    }

    /// Call once per accepted mutation.
    pub fn touch(&mut self) {
        self.version += 1;
    }

    pub fn member_views(&self) -> Vec<MemberView> {
        self.members.iter().map(Membership::view).collect()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.room_id.clone(),
            problem_id: self.problem_id.clone(),
            members: self.member_views(),
        }
    }
}
