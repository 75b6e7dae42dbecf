//! Mode Orchestrators (spec.md §4.8): the three top-level research flows
//! that compose the Worker Loop, Citation Registry, Checkpoint Store, and
//! LLM Gateway into complete runs.

pub mod academic;
pub mod ask;
pub mod flat;
pub mod resume;
pub mod setup_pipeline;
