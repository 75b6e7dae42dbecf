pub mod checkpoint;
pub mod citations;
pub mod core;
pub mod events;
pub mod fetch;
pub mod http;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod setup;
pub mod worker;

pub use core::app_state::AppState;
pub use core::types;
