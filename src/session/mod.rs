//! Conversation state: the transcript and the orchestrator that drives it

pub mod orchestrator;
pub mod transcript;

pub use orchestrator::SessionOrchestrator;
pub use transcript::{Message, Role, Transcript};
