//! Core engine for iterative thought exploration.
//!
//! Owns the session state machine (guided question/answer steps and the
//! adversarial debate exchange), the resilient client for the external
//! text-generation service, and the history/summary aggregation. Rendering,
//! microphone capture, and speech-to-text are collaborator concerns and
//! live behind the interfaces the service crate defines.

pub mod client;
pub mod error;
pub mod history;
pub mod prompts;
pub mod session;

pub use client::{CHALLENGE_QUESTION_COUNT, GeminiClient, GenerateApi, MAX_RETRIES, StructuredReply};
pub use error::{ClientError, SessionError, ValidationError};
pub use history::{ThoughtHistory, ThoughtStep, summary_prompt};
pub use session::{
    DebateTurn, DispatchedCall, ProviderReply, ProviderRequest, Role, SessionMode, SessionOutcome,
    ThoughtSession,
};
