//! Agent loop: conversation state, run events and the runner.

pub mod conversation;
pub mod events;
pub mod runner;
pub mod types;

pub use conversation::ConversationState;
pub use events::{RunEvent, RunEventPayload, RunEventSink};
pub use runner::AgentLoop;
pub use types::{RunId, RunOutcome, RunReport};
