//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for Kaachan, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Chat (`/api/chat`)
//! - `POST /api/chat` - Send a user message and receive the persona's reply
//!
//! ## Sessions (`/api/sessions`)
//! - `POST /api/sessions` - Start a session (with greeting)
//! - `GET /api/sessions/{id}` - Get transcript and summary
//! - `DELETE /api/sessions/{id}` - Delete a session
//! - `PUT /api/sessions/{id}/persona` - Switch persona
//!
//! ## Personas (`/api/personas`)
//! - `GET /api/personas` - Persona catalog
//!
//! ## Health
//! - `GET /health` - Liveness probe
//!
//! Errors are returned as `{"error": "<localized message>"}` with 400, 404,
//! 500 or 504 status codes.
//!
//! # OpenAPI Documentation
//!
//! When the `swagger-ui` feature is enabled, interactive API documentation
//! is available at `/swagger-ui/`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use utoipa::OpenApi;

/// OpenAPI description of the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    info(title = "Kaachan API", description = "Persona-driven conversation server"),
    paths(
        handlers::health,
        handlers::chat::chat,
        handlers::personas::list_personas,
        handlers::sessions::create_session,
        handlers::sessions::get_session,
        handlers::sessions::delete_session,
        handlers::sessions::switch_persona,
    ),
    components(schemas(
        crate::types::ChatRequest,
        crate::types::ChatResponse,
        crate::types::ChatMessageInput,
        crate::types::CreateSessionRequest,
        crate::types::SwitchPersonaRequest,
        crate::types::PersonaSwitchResponse,
        crate::types::HealthResponse,
        crate::types::ErrorResponse,
        crate::types::Message,
        crate::types::MessageRole,
        crate::types::Persona,
        crate::session::Session,
        crate::memory::ConversationSummary,
        crate::memory::AssistantResponseAnalysis,
        crate::memory::ResponseIntent,
        crate::analysis::EmotionalContext,
        crate::persona::PersonaProfile,
        crate::persona::RePrimeReport,
    )),
    tags(
        (name = "chat", description = "Conversation turns"),
        (name = "sessions", description = "Session lifecycle"),
        (name = "personas", description = "Persona catalog"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/health",
            "/api/chat",
            "/api/personas",
            "/api/sessions",
            "/api/sessions/{id}",
            "/api/sessions/{id}/persona",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }
}
