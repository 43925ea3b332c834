#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Turn-limited practice dialogues.
//!
//! A [`DialogueSession`] talks with the user on a fixed topic, replays a
//! bounded window of recent turns to the model, counts exchanges against a
//! budget and ends with an evaluation of the user, either when the budget is
//! used up or when the user asks to stop. The [`SessionRegistry`] owns one
//! session and one preference record per user.

mod budget;
mod error;
mod history;
mod preferences;
mod prompt;
mod registry;
mod session;

pub use budget::TurnBudget;
pub use error::{ConversationError, Result};
pub use history::{ConversationMemory, Speaker, Turn};
pub use preferences::PreferenceRecord;
pub use prompt::{EvaluationRubric, PromptConfig, wrap_up_request};
pub use registry::{Readiness, SessionHandle, SessionRegistry};
pub use session::{DialogueSession, Reply, SessionSettings, SessionState};
