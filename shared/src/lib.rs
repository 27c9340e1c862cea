use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier, assigned by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Opaque room identifier, generated at room creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

/// Opaque problem identifier, supplied by the problem-selection collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    Python,
    Javascript,
    Java,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Java => "java",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Live,
    Finished,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Live => "live",
            RoomStatus::Finished => "finished",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Submitted,
}

/// A member's participation record as seen on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberView {
    pub user_id: UserId,
    pub username: String,
    pub rating: i32,
    pub is_creator: bool,
    pub score: u32,
    pub submission_status: SubmissionStatus,
}

/// Commands a connection may issue after authenticating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientCommand {
    CreateRoom,
    JoinRoom {
        room_id: Option<RoomId>,
    },
    StartMatch {
        room_id: RoomId,
    },
    SubmitSolution {
        room_id: RoomId,
        code: String,
        language: Language,
    },
    LeaveRoom {
        room_id: RoomId,
    },
}

/// Wire-level classification of a rejected command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    NotAuthorized,
    StateConflict,
    Collaborator,
    Capacity,
    BadRequest,
}

/// Everything the server sends: direct responses to commands and events
/// pushed to every member of a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerEvent {
    RoomJoined {
        room_id: RoomId,
        problem_id: ProblemId,
        members: Vec<MemberView>,
    },
    StartAck {
        room_id: RoomId,
    },
    SubmissionResult {
        room_id: RoomId,
        score: u32,
        passed_test_count: u32,
    },
    LeaveAck {
        room_id: RoomId,
    },
    CommandFailed {
        code: ErrorCode,
        message: String,
    },
    RoomUpdate {
        room_id: RoomId,
        version: u64,
        members: Vec<MemberView>,
    },
    MatchStart {
        room_id: RoomId,
        problem_id: ProblemId,
        members: Vec<MemberView>,
    },
    ScoreUpdate {
        room_id: RoomId,
        members: Vec<MemberView>,
    },
    SubmissionUpdate {
        room_id: RoomId,
        user_id: UserId,
        status: SubmissionStatus,
        score: u32,
        passed_test_count: u32,
    },
    MatchFinished {
        room_id: RoomId,
        members: Vec<MemberView>,
    },
}
