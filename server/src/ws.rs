use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use shared::{ClientCommand, ErrorCode, ServerEvent};
use tokio::sync::mpsc;

use crate::auth::{AuthError, Identity};
use crate::room_manager::{AppState, Tx};

/// The identity gate runs before the upgrade completes: a refused
/// credential never reaches the command loop.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    match authenticate(&state, &headers).await {
        Ok(identity) => ws.on_upgrade(move |socket| handle_socket(socket, state, identity)),
        Err(err) => {
            tracing::warn!(error = %err, "Rejected connection");
            (StatusCode::UNAUTHORIZED, err.to_string()).into_response()
        }
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let credential = bearer_token(headers).ok_or(AuthError::MissingCredential)?;
    state.gate.verify(&credential).await
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::to_owned)
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Identity) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Forward engine events to the socket until either side goes away.
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    state.register_connection(&identity, tx.clone());

    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientCommand>(&text) {
                Ok(command) => dispatch(&state, &identity, &tx, command).await,
                Err(err) => {
                    tracing::debug!(user_id = %identity.user_id, error = %err, "Malformed command");
                    let _ = tx.send(ServerEvent::CommandFailed {
                        code: ErrorCode::BadRequest,
                        message: "malformed command".to_string(),
                    });
                }
            }
        }
    }

    // Client disconnected: implicit leave from every room they occupy.
    state.disconnect(&identity.user_id).await;
}

async fn dispatch(state: &Arc<AppState>, identity: &Identity, tx: &Tx, command: ClientCommand) {
    let result = match command {
        ClientCommand::CreateRoom => {
            state
                .create_room(identity)
                .await
                .map(|summary| ServerEvent::RoomJoined {
                    room_id: summary.room_id,
                    problem_id: summary.problem_id,
                    members: summary.members,
                })
        }
        ClientCommand::JoinRoom { room_id } => {
            state
                .join_room(identity, room_id)
                .await
                .map(|summary| ServerEvent::RoomJoined {
                    room_id: summary.room_id,
                    problem_id: summary.problem_id,
                    members: summary.members,
                })
        }
        ClientCommand::StartMatch { room_id } => state
            .start_match(identity, &room_id)
            .await
            .map(|()| ServerEvent::StartAck { room_id }),
        ClientCommand::SubmitSolution {
            room_id,
            code,
            language,
        } => state
            .submit_solution(identity, &room_id, &code, language)
            .await
            .map(|verdict| ServerEvent::SubmissionResult {
                room_id,
                score: verdict.score,
                passed_test_count: verdict.passed_test_count,
            }),
        ClientCommand::LeaveRoom { room_id } => {
            state.leave_room(identity, &room_id).await;
            Ok(ServerEvent::LeaveAck { room_id })
        }
    };

    let event = result.unwrap_or_else(|err| {
        tracing::debug!(user_id = %identity.user_id, error = %err, "Command rejected");
        ServerEvent::CommandFailed {
            code: err.code(),
            message: err.to_string(),
        }
    });
    let _ = tx.send(event);
}
