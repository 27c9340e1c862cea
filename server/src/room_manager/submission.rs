use std::time::SystemTime;

use shared::{Language, RoomId, RoomStatus, ServerEvent, SubmissionStatus};

use crate::auth::Identity;
use crate::errors::RoomError;
use crate::judge::{JudgeError, Verdict};
use crate::room_manager::AppState;

impl AppState {
    pub async fn submit_solution(
        &self,
        identity: &Identity,
        room_id: &RoomId,
        code: &str,
        language: Language,
    ) -> Result<Verdict, RoomError> {
        if !self.judge.supports(language) {
            return Err(RoomError::UnsupportedLanguage(language));
        }

        let handle = self
            .room_handle(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

        // Precondition pass. The lock is released before the judging call so
        // a slow judge never wedges the room.
        let problem_id = {
            let room = handle.lock().await;
            if !room.is_active {
                return Err(RoomError::RoomNotFound(room_id.clone()));
            }
            if !room.contains(&identity.user_id) {
                return Err(RoomError::NotAMember {
                    user_id: identity.user_id.clone(),
                    room_id: room_id.clone(),
                });
            }
            if room.status != RoomStatus::Live {
                return Err(RoomError::WrongStatus {
                    room_id: room_id.clone(),
                    expected: RoomStatus::Live,
                    actual: room.status,
                });
            }
            room.problem_id.clone()
        };

        let timeout = self.config.judge_timeout;
        let verdict = match tokio::time::timeout(
            timeout,
            self.judge.evaluate(&problem_id, code, language),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(room_id = %room_id, user_id = %identity.user_id, "Judge timed out");
                return Err(RoomError::Judge(JudgeError::Timeout(timeout)));
            }
        };

        // The room may have moved on while the judge ran; re-validate before
        // writing anything.
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
        {
            let member = match room.member_mut(&identity.user_id) {
                Some(member) => member,
                None => {
                    return Err(RoomError::NotAMember {
                        user_id: identity.user_id.clone(),
                        room_id: room_id.clone(),
                    })
                }
            };
            // Last submission counts: a resubmission replaces the prior score.
            member.score = verdict.score;
            member.submission_status = SubmissionStatus::Submitted;
            member.submission_time = Some(SystemTime::now());
        }
        room.touch();
        tracing::info!(
            room_id = %room.room_id,
            user_id = %identity.user_id,
            score = verdict.score,
            passed = verdict.passed_test_count,
            "Submission scored"
        );

        self.broadcast(
            &room,
            ServerEvent::ScoreUpdate {
                room_id: room.room_id.clone(),
                members: room.member_views(),
            },
        );
        self.broadcast(
            &room,
            ServerEvent::SubmissionUpdate {
                room_id: room.room_id.clone(),
                user_id: identity.user_id.clone(),
                status: SubmissionStatus::Submitted,
                score: verdict.score,
                passed_test_count: verdict.passed_test_count,
            },
        );

        if room.all_submitted() {
            self.finish_room(&mut room);
        }

        Ok(verdict)
    }
}
