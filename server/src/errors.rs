use shared::{ErrorCode, Language, RoomId, RoomStatus, UserId};
use thiserror::Error;

use crate::judge::JudgeError;
use crate::problems::ProblemBankError;

/// Caller-visible rejection of a room command. None of these terminate the
/// connection or leave room state partially written.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error("user {user_id} is not a member of room {room_id}")]
    NotAMember { user_id: UserId, room_id: RoomId },
    #[error("only the room creator can start the match")]
    NotCreator,
    #[error("room {room_id} is {actual}, action requires {expected}")]
    WrongStatus {
        room_id: RoomId,
        expected: RoomStatus,
        actual: RoomStatus,
    },
    #[error("room {0} is already at capacity")]
    RoomFull(RoomId),
    #[error("language {0} is not supported by the judge")]
    UnsupportedLanguage(Language),
    #[error("problem selection failed: {0}")]
    ProblemBank(#[from] ProblemBankError),
    #[error("judging failed: {0}")]
    Judge(#[from] JudgeError),
}

impl RoomError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::RoomNotFound(_) | RoomError::NotAMember { .. } => ErrorCode::NotFound,
            RoomError::NotCreator => ErrorCode::NotAuthorized,
            RoomError::WrongStatus { .. } => ErrorCode::StateConflict,
            RoomError::RoomFull(_) => ErrorCode::Capacity,
            RoomError::UnsupportedLanguage(_) => ErrorCode::BadRequest,
            RoomError::ProblemBank(_) | RoomError::Judge(_) => ErrorCode::Collaborator,
        }
    }
}
