//! Shared application state (spec.md §4, ambient stack): the HTTP layer's
//! single `Arc<AppState>`, wiring together the Event Bus, Checkpoint
//! Store, Source Fetcher, and LLM Gateway.
//!
//! Grounded on the teacher's `AppState` (builder-style construction,
//! an outbound semaphore, file-backed config loaded once at startup),
//! narrowed to the subsystems spec.md's REDESIGN FLAG asks for: no
//! lazily-initialized optional subsystems (memory/proxy manager), no
//! ambient mutable config statics — `FileConfig` is loaded once here and
//! threaded explicitly from this point on.

use crate::checkpoint::CheckpointStore;
use crate::core::config::FileConfig;
use crate::events::{EventBus, LogBuffers};
use crate::fetch::SearchService;
use crate::llm::LlmGateway;
use dashmap::DashMap;
use std::env;
use std::sync::Arc;

/// In-memory record of an Ask session for `/ask/list` (spec.md §6).
/// Ask mode has no checkpoint file — it's a single interactive run, not
/// resumable — so this is the only durable-for-the-process-lifetime
/// record of it existing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AskSessionRecord {
    pub session_id: String,
    pub question: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// An Ask session registered by `/ask/start` but not yet started — the
/// actual `orchestrator::ask::run` task is spawned lazily by the first
/// `/ask/events/{id}` subscriber, so no progress event can be emitted
/// before anyone is listening (the Event Bus has no replay buffer).
pub struct PendingAsk {
    pub question: String,
    pub config: crate::core::config::ApiConfig,
}

pub struct AppState {
    pub http_client: reqwest::Client,
    pub events: EventBus,
    pub log_buffers: LogBuffers,
    pub checkpoints: CheckpointStore,
    pub search: SearchService,
    pub gateway: LlmGateway,
    pub outbound_limit: Arc<tokio::sync::Semaphore>,
    pub file_config: Arc<FileConfig>,
    pub ask_sessions: Arc<DashMap<String, AskSessionRecord>>,
    pub ask_pending: Arc<DashMap<String, PendingAsk>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("checkpoint_root", &self.checkpoints.root())
            .field("ask_sessions", &self.ask_sessions.len())
            .finish()
    }
}

impl AppState {
    /// `log_buffers` must be the same instance installed into the
    /// `tracing` subscriber as a `LogBufferLayer` at startup, so that
    /// orchestrators draining it here see what `tracing` wrote there.
    pub fn new(http_client: reqwest::Client, file_config: FileConfig, log_buffers: LogBuffers) -> Self {
        let outbound_limit = env::var("OUTBOUND_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(32);

        let checkpoint_root = file_config.resolve_checkpoint_root();

        Self {
            search: SearchService::new(http_client.clone()),
            gateway: LlmGateway::new(http_client.clone()),
            http_client,
            events: EventBus::new(),
            log_buffers,
            checkpoints: CheckpointStore::new(checkpoint_root),
            outbound_limit: Arc::new(tokio::sync::Semaphore::new(outbound_limit)),
            file_config: Arc::new(file_config),
            ask_sessions: Arc::new(DashMap::new()),
            ask_pending: Arc::new(DashMap::new()),
        }
    }
}
