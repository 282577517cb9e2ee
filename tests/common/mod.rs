#![allow(dead_code)]

pub mod mocks;

use kaachan::{OrchestratorSettings, ResponseOrchestrator, SessionSettings, SessionStore};
use mocks::MockGenerationClient;
use std::sync::Arc;

/// Orchestrator over an in-memory store, returning the mock for inspection.
pub fn orchestrator_with(
    client: MockGenerationClient,
    settings: OrchestratorSettings,
) -> (ResponseOrchestrator, Arc<MockGenerationClient>) {
    let client = Arc::new(client);
    let store = Arc::new(SessionStore::in_memory(SessionSettings {
        max_messages: settings.max_messages,
        ..SessionSettings::default()
    }));
    let orchestrator = ResponseOrchestrator::new(client.clone(), store, settings);
    (orchestrator, client)
}
