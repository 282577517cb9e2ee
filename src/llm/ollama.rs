use crate::llm::client::{GenerationClient, GenerationError, SessionHistories};
use crate::types::{Message, MessageRole, Result};
use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    Ollama,
};

const DEFAULT_PORT: u16 = 11434;
const MAX_TURNS: usize = 40;

pub struct OllamaClient {
    client: Ollama,
    model: String,
    histories: SessionHistories<ChatMessage>,
}

impl OllamaClient {
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let (host, port) = split_host_port(&base_url);
        tracing::debug!(%host, port, %model, "Creating Ollama client");

        Ok(Self {
            client: Ollama::new(host, port),
            model,
            histories: SessionHistories::new(MAX_TURNS),
        })
    }
}

/// Splits `scheme://host:port` into an Ollama host (with scheme) and port.
fn split_host_port(base_url: &str) -> (String, u16) {
    let trimmed = base_url.trim_end_matches('/');
    let (scheme, rest) = match trimmed.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", trimmed),
    };
    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().unwrap_or(DEFAULT_PORT)),
        None => (rest, DEFAULT_PORT),
    };
    let host = if host.is_empty() { "localhost" } else { host };
    (format!("{}://{}", scheme, host), port)
}

fn to_chat_message(turn: &Message) -> ChatMessage {
    match turn.role {
        MessageRole::User => ChatMessage::user(turn.content.clone()),
        MessageRole::Assistant => ChatMessage::assistant(turn.content.clone()),
    }
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn generate(
        &self,
        session_id: &str,
        prompt: &str,
    ) -> std::result::Result<String, GenerationError> {
        let user_turn = ChatMessage::user(prompt.to_string());
        let mut messages = self.histories.snapshot(session_id);
        messages.push(user_turn.clone());

        let request = ChatMessageRequest::new(self.model.clone(), messages);
        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| GenerationError::classify(format!("Ollama error: {}", e)))?;

        let reply = response.message.content;
        if reply.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        self.histories.push(
            session_id,
            [user_turn, ChatMessage::assistant(reply.clone())],
        );
        Ok(reply)
    }

    async fn reset_session(
        &self,
        session_id: &str,
        system_prompt: &str,
    ) -> std::result::Result<(), GenerationError> {
        self.histories
            .reset(session_id, vec![ChatMessage::system(system_prompt.to_string())]);
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
        if !self.histories.try_push(session_id, to_chat_message(turn)) {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_host_port() {
        assert_eq!(
            split_host_port("http://localhost:11434"),
            ("http://localhost".to_string(), 11434)
        );
        assert_eq!(
            split_host_port("https://ollama.internal/"),
            ("https://ollama.internal".to_string(), 11434)
        );
        assert_eq!(
            split_host_port("127.0.0.1:9000"),
            ("http://127.0.0.1".to_string(), 9000)
        );
    }

    #[tokio::test]
    async fn test_replay_rejects_empty_turn() {
        let client = OllamaClient::new("http://localhost:11434".to_string(), "llama3.2".to_string())
            .await
            .unwrap();
        let result = client.replay_turn("s", &Message::assistant("", 0)).await;
        assert!(matches!(result, Err(GenerationError::InvalidInput(_))));
        assert_eq!(client.model_name(), "llama3.2");
    }
}
