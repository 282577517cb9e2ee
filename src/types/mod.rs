use crate::llm::GenerationError;
use crate::memory::ConversationSummary;
use crate::persona::RePrimeReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

// ============= Conversation Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    /// `model` is accepted on input for compatibility with Gemini-style role names.
    #[serde(alias = "model")]
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single conversation turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// Unix timestamp in milliseconds; non-decreasing within a session.
    pub timestamp: i64,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self::new(MessageRole::User, content, timestamp)
    }

    pub fn assistant(content: impl Into<String>, timestamp: i64) -> Self {
        Self::new(MessageRole::Assistant, content, timestamp)
    }
}

// ============= Persona Types =============

/// Behavioral profile of the assistant.
///
/// Adding a variant is a compile-time checked change: every prompt table in
/// [`crate::persona`] matches exhaustively.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    #[default]
    Caring,
    Strict,
    Fun,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::Caring, Persona::Strict, Persona::Fun];

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Caring => "caring",
            Persona::Strict => "strict",
            Persona::Fun => "fun",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caring" => Ok(Persona::Caring),
            "strict" => Ok(Persona::Strict),
            "fun" => Ok(Persona::Fun),
            other => Err(AppError::Validation(format!("Unknown persona: {}", other))),
        }
    }
}

// ============= API Request/Response Types =============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageInput {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// Client-side transcript; the last entry must be the new user message.
    pub messages: Vec<ChatMessageInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Message>>,
    pub timestamp: i64,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub persona: Option<Persona>,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SwitchPersonaRequest {
    pub persona: Persona,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PersonaSwitchResponse {
    pub session_id: String,
    pub persona: Persona,
    /// Whether the persona actually changed.
    pub switched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reprime: Option<RePrimeReport>,
    pub history: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    /// True once session storage has fallen back to process memory.
    pub storage_degraded: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Generation timed out after {0} ms")]
    Timeout(u64),

    #[error("Generation returned an empty response")]
    EmptyResponse,

    #[error("Generation error: {0}")]
    Generation(GenerationError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::EmptyResponse => AppError::EmptyResponse,
            other => AppError::Generation(other),
        }
    }
}

impl AppError {
    /// End-user facing message. Internal details stay in the logs.
    pub fn localized_message(&self) -> &'static str {
        match self {
            AppError::Validation(_) => {
                "メッセージの形式が正しくありません。メッセージは1〜500文字で入力してください。"
            }
            AppError::Timeout(_) => "応答がタイムアウトしました。もう一度お試しください。",
            AppError::EmptyResponse => "申し訳ありません。正しい応答を生成できませんでした。",
            AppError::Generation(kind) => match kind {
                GenerationError::RateLimit(_) => {
                    "アクセスが集中しています。しばらく待ってから再度お試しください。"
                }
                GenerationError::InvalidInput(_) => {
                    "申し訳ありません。入力内容を確認して、もう一度お試しください。"
                }
                GenerationError::EmptyResponse => {
                    "申し訳ありません。正しい応答を生成できませんでした。"
                }
                GenerationError::ContextLengthExceeded(_) => {
                    "申し訳ありません。メッセージが長すぎます。簡潔な質問に分けてお試しください。"
                }
                GenerationError::Other(_) => {
                    "予期せぬエラーが発生しました。しばらく待ってから再度お試しください。"
                }
            },
            AppError::NotFound(_) => "セッションが見つかりません。新しい会話を始めてください。",
            AppError::Storage(_) | AppError::Config(_) | AppError::Internal(_) => {
                "予期せぬエラーが発生しました。しばらく待ってから再度お試しください。"
            }
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmptyResponse
            | AppError::Generation(_)
            | AppError::Storage(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Timeouts may be re-submitted by the caller; nothing is retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Timeout(_) | AppError::Generation(GenerationError::RateLimit(_))
        )
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.localized_message().to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_persona_round_trips_through_str() {
        for persona in Persona::ALL {
            assert_eq!(persona.as_str().parse::<Persona>().unwrap(), persona);
        }
        assert!("grumpy".parse::<Persona>().is_err());
    }

    #[test]
    fn test_model_role_alias() {
        let msg: ChatMessageInput =
            serde_json::from_str(r#"{"role":"model","content":"hi"}"#).unwrap();
        assert_eq!(msg.role, MessageRole::Assistant);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Timeout(15000).status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            AppError::Generation(GenerationError::Other("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_empty_generation_maps_to_empty_response() {
        let err: AppError = GenerationError::EmptyResponse.into();
        assert!(matches!(err, AppError::EmptyResponse));
    }

    #[test]
    fn test_rate_limit_is_localized_and_retryable() {
        let err: AppError = GenerationError::RateLimit("429".into()).into();
        assert!(err.is_retryable());
        assert!(err.localized_message().contains("アクセスが集中"));
    }
}
