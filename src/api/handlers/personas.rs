use crate::{persona::PersonaProfile, AppState};
use axum::{extract::State, Json};

/// List the available personas with their welcome lines and example prompts
#[utoipa::path(
    get,
    path = "/api/personas",
    responses(
        (status = 200, description = "Persona catalog", body = Vec<PersonaProfile>)
    ),
    tag = "personas"
)]
pub async fn list_personas(State(state): State<AppState>) -> Json<Vec<PersonaProfile>> {
    Json(state.orchestrator.prompts().catalog())
}
