use crate::{
    types::{AppError, ChatRequest, ChatResponse, Message, MessageRole, Result},
    AppState,
};
use axum::{extract::rejection::JsonRejection, extract::State, Json};

/// Send the next user message and receive the persona's reply
///
/// The last entry of `messages` is the new user message. A missing or expired
/// `session_id` starts a new session seeded with the earlier entries; for a
/// live session the server-side transcript is authoritative and earlier
/// entries are ignored. A `persona` that differs from the session's switches
/// it before generating.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Generated reply", body = ChatResponse),
        (status = 400, description = "Malformed request or invalid message", body = crate::types::ErrorResponse),
        (status = 500, description = "Generation failed", body = crate::types::ErrorResponse),
        (status = 504, description = "Generation timed out", body = crate::types::ErrorResponse)
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let Some((last, earlier)) = payload
        .messages
        .split_last()
        .filter(|(last, _)| last.role == MessageRole::User)
    else {
        return Err(AppError::Validation(
            "the last message must be a user message".to_string(),
        ));
    };

    let orchestrator = &state.orchestrator;

    // Reject before a session is created or touched.
    orchestrator.validate_message(&last.content)?;

    let transcript: Vec<Message> = earlier
        .iter()
        .map(|m| Message::new(m.role, m.content.clone(), 0))
        .collect();

    let session = orchestrator
        .ensure_session(
            payload.session_id.as_deref(),
            payload.persona.unwrap_or_default(),
            payload.user_name.clone(),
            &transcript,
        )
        .await?;

    if let Some(requested) = payload.persona {
        if requested != session.persona {
            orchestrator
                .switch_persona(&session.session_id, requested)
                .await?;
        }
    }

    let outcome = orchestrator
        .generate_response(&session.session_id, &last.content)
        .await?;

    Ok(Json(ChatResponse {
        response: outcome.response,
        session_id: outcome.session_id,
        context: Some(outcome.summary),
        history: Some(outcome.history),
        timestamp: outcome.timestamp,
    }))
}
