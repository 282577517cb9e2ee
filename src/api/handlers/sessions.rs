use crate::{
    session::Session,
    types::{AppError, CreateSessionRequest, PersonaSwitchResponse, Result, SwitchPersonaRequest},
    AppState,
};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

/// Start a new session, greeted in the chosen persona's voice
#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body(content = CreateSessionRequest, description = "Optional; an empty body uses the default persona"),
    responses(
        (status = 201, description = "Session created", body = Session),
        (status = 400, description = "Malformed request", body = crate::types::ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Session>)> {
    let request: CreateSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::Validation(e.to_string()))?
    };

    let session = state
        .orchestrator
        .create_session(request.persona.unwrap_or_default(), request.user_name, true)
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Get a live session with its transcript and summary
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session", body = Session),
        (status = 404, description = "Unknown or expired session", body = crate::types::ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>> {
    state.orchestrator.get_session(&id).map(Json)
}

/// Delete a session
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Unknown or expired session", body = crate::types::ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.orchestrator.delete_session(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Switch the session's persona
///
/// Appends a transition message and re-primes the generation session with
/// the preceding turns. Switching to the current persona changes nothing.
#[utoipa::path(
    put,
    path = "/api/sessions/{id}/persona",
    params(("id" = String, Path, description = "Session id")),
    request_body = SwitchPersonaRequest,
    responses(
        (status = 200, description = "Persona switch result", body = PersonaSwitchResponse),
        (status = 400, description = "Unknown persona", body = crate::types::ErrorResponse),
        (status = 404, description = "Unknown or expired session", body = crate::types::ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn switch_persona(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<SwitchPersonaRequest>, JsonRejection>,
) -> Result<Json<PersonaSwitchResponse>> {
    let Json(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let outcome = state
        .orchestrator
        .switch_persona(&id, payload.persona)
        .await?;

    Ok(Json(PersonaSwitchResponse {
        session_id: outcome.session.session_id,
        persona: outcome.session.persona,
        switched: outcome.transition.is_some(),
        transition: outcome.transition,
        reprime: outcome.reprime,
        history: outcome.session.messages,
    }))
}
