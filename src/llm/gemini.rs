//! Google Gemini `generateContent` client.

use crate::llm::client::{GenerationClient, GenerationError, GenerationParams, SessionHistories};
use crate::types::{AppError, Message, MessageRole, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Turns retained per session after the system prompt (one exchange is two turns).
pub const DEFAULT_MAX_TURNS: usize = 40;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn new(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![GeminiPart {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [GeminiContent],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl From<GenerationParams> for GenerationConfig {
    fn from(p: GenerationParams) -> Self {
        Self {
            temperature: p.temperature,
            top_p: p.top_p,
            top_k: p.top_k,
            max_output_tokens: p.max_output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

fn gemini_role(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "model",
    }
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    params: GenerationParams,
    base_url: String,
    histories: SessionHistories<GeminiContent>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, params: GenerationParams) -> Result<Self> {
        Self::with_base_url(api_key, model, params, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client against a custom endpoint (proxies, tests)
    pub fn with_base_url(
        api_key: String,
        model: String,
        params: GenerationParams,
        base_url: String,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config("Gemini API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model,
            params,
            base_url: base_url.trim_end_matches('/').to_string(),
            histories: SessionHistories::new(DEFAULT_MAX_TURNS),
        })
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.histories = SessionHistories::new(max_turns);
        self
    }

    async fn send(
        &self,
        contents: &[GeminiContent],
    ) -> std::result::Result<String, GenerationError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = GenerateContentRequest {
            contents,
            generation_config: self.params.into(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Other(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(body);

            tracing::error!(code = status.as_u16(), message = %message, "Gemini API error");
            return Err(map_status(status, message));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Other(format!("Invalid Gemini response: {}", e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

fn map_status(status: StatusCode, message: String) -> GenerationError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimit(message),
        StatusCode::BAD_REQUEST => {
            let lower = message.to_lowercase();
            if lower.contains("token") || lower.contains("context") {
                GenerationError::ContextLengthExceeded(message)
            } else {
                GenerationError::InvalidInput(message)
            }
        }
        _ => GenerationError::Other(format!("HTTP {}: {}", status.as_u16(), message)),
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(
        &self,
        session_id: &str,
        prompt: &str,
    ) -> std::result::Result<String, GenerationError> {
        let user_turn = GeminiContent::new("user", prompt);
        let mut contents = self.histories.snapshot(session_id);
        contents.push(user_turn.clone());

        let reply = self.send(&contents).await?;

        // Only a successful exchange becomes part of the chat history.
        self.histories
            .push(session_id, [user_turn, GeminiContent::new("model", &reply)]);
        Ok(reply)
    }

    async fn reset_session(
        &self,
        session_id: &str,
        system_prompt: &str,
    ) -> std::result::Result<(), GenerationError> {
        self.histories
            .reset(session_id, vec![GeminiContent::new("user", system_prompt)]);
        Ok(())
    }

    async fn replay_turn(
        &self,
        session_id: &str,
        turn: &Message,
    ) -> std::result::Result<(), GenerationError> {
        if turn.content.trim().is_empty() {
            return Err(GenerationError::InvalidInput(
                "cannot replay an empty turn".to_string(),
            ));
        }

        let content = GeminiContent::new(gemini_role(turn.role), &turn.content);
        if !self.histories.try_push(session_id, content) {
            return Err(GenerationError::ContextLengthExceeded(format!(
                "session history budget of {} turns is full",
                self.histories.max_turns()
            )));
        }
        Ok(())
    }

    async fn end_session(&self, session_id: &str) {
        self.histories.remove(session_id);
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
