//! Query workflow: a small state machine over
//! `Route -> StructuredAgent -> SemanticAgent -> Synthesize -> End`
//!
//! Hybrid queries always run the structured engine to completion before the
//! semantic engine starts.

pub mod executor;
pub mod response;
pub mod state;
pub mod synthesize;

pub use executor::{Orchestrator, SystemInfo};
pub use response::{EngineResult, FinalResponse, ResponseMetadata};
pub use state::{next_stage, Stage, StateError, WorkflowState, MAX_STAGES};
pub use synthesize::{concatenate, ResponseSynthesizer, APOLOGY_MESSAGE};
