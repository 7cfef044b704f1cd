//! The session state machine driving guided exploration and debate.
//!
//! A single task owns a [`ThoughtSession`] and is its only writer.
//! Operations never block on the network: anything that needs the provider
//! returns a [`DispatchedCall`] describing one background call, and the
//! reply is fed back through [`ThoughtSession::apply`] tagged with the
//! call's generation. A reply whose generation is no longer current (the
//! call was abandoned by a mode switch or reset) is dropped untouched.

use crate::client::{GenerateApi, StructuredReply};
use crate::error::{SessionError, ValidationError};
use crate::history::{ThoughtHistory, ThoughtStep, summary_prompt};
use crate::prompts::{BLOG_INSTRUCTION, DEBATE_INSTRUCTION, THOUGHT_COACH_INSTRUCTION};

/// Input seeds shown by the surface layer. A submission still carrying one
/// of these is treated as missing input.
pub const NEW_THOUGHT_PLACEHOLDER: &str = "Start a new thought here...";
pub const RESPONSE_PLACEHOLDER: &str = "Enter your response here...";
pub const REBUTTAL_PLACEHOLDER: &str = "Enter your counter-argument here...";

const PLACEHOLDERS: [&str; 3] = [
    NEW_THOUGHT_PLACEHOLDER,
    RESPONSE_PLACEHOLDER,
    REBUTTAL_PLACEHOLDER,
];

fn is_usable_input(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !PLACEHOLDERS.iter().any(|p| trimmed.starts_with(p))
}

/// Which interaction surface is active. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Guided,
    Debate,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Guided => write!(f, "guided"),
            SessionMode::Debate => write!(f, "debate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name sent to the provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One debate exchange entry. The full ordered list is resent to the
/// provider on every turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateTurn {
    pub role: Role,
    pub text: String,
}

impl DebateTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// A background provider call the runtime must execute. The reply must be
/// applied with the same generation, which is only honored while the call
/// is still the session's current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedCall {
    pub generation: u64,
    pub request: ProviderRequest,
}

/// The concrete call to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRequest {
    /// Refine raw text into formal prose plus three challenge questions.
    Refine { user_text: String },
    /// Next devil's-advocate turn over the debate so far.
    Debate { turns: Vec<DebateTurn> },
    /// Narrative blog-post summary of the compiled transcript.
    Summarize { transcript: String },
}

impl ProviderRequest {
    /// Executes the call against the provider. The reply is handed back to
    /// whichever task owns the session, which applies it via
    /// [`ThoughtSession::apply`].
    pub async fn execute<C: GenerateApi + Sync>(&self, client: &C) -> ProviderReply {
        match self {
            ProviderRequest::Refine { user_text } => ProviderReply::Refined(
                client
                    .invoke_structured(user_text, THOUGHT_COACH_INSTRUCTION)
                    .await,
            ),
            ProviderRequest::Debate { turns } => {
                ProviderReply::Rebuttal(client.invoke_chat(turns, DEBATE_INSTRUCTION).await)
            }
            ProviderRequest::Summarize { transcript } => ProviderReply::Summary(
                client
                    .invoke_chat(&[DebateTurn::user(transcript.clone())], BLOG_INSTRUCTION)
                    .await,
            ),
        }
    }
}

/// Outcome of a dispatched call, as delivered back to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderReply {
    Refined(Result<Option<StructuredReply>, crate::error::ClientError>),
    Rebuttal(Result<Option<String>, crate::error::ClientError>),
    Summary(Result<Option<String>, crate::error::ClientError>),
}

/// What applying a provider reply did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A refined thought is now pending a focus selection.
    ThoughtRefined(StructuredReply),
    /// The opponent's next argument was appended to the debate.
    OpponentArgued(String),
    /// The compiled summary text. Not stored on the session.
    SummaryReady(String),
    /// The reply belonged to an abandoned call and was dropped untouched.
    Stale,
}

/// The root session aggregate and its state machine.
#[derive(Debug)]
pub struct ThoughtSession {
    mode: SessionMode,
    current_step: u32,
    history: ThoughtHistory,
    pending: Option<StructuredReply>,
    selected_focus: Option<String>,
    debate_turns: Vec<DebateTurn>,
    generation: u64,
    in_flight: Option<u64>,
}

impl Default for ThoughtSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ThoughtSession {
    pub fn new() -> Self {
        Self {
            mode: SessionMode::Guided,
            current_step: 1,
            history: ThoughtHistory::default(),
            pending: None,
            selected_focus: None,
            debate_turns: Vec::new(),
            generation: 0,
            in_flight: None,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn history(&self) -> &ThoughtHistory {
        &self.history
    }

    /// The refined thought awaiting a focus selection, if any.
    pub fn pending(&self) -> Option<&StructuredReply> {
        self.pending.as_ref()
    }

    pub fn selected_focus(&self) -> Option<&str> {
        self.selected_focus.as_deref()
    }

    pub fn debate_turns(&self) -> &[DebateTurn] {
        &self.debate_turns
    }

    /// Whether a dispatched call has not been applied yet. New submissions
    /// are rejected while this holds.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    fn require_mode(&self, mode: SessionMode) -> Result<(), ValidationError> {
        if self.mode != mode {
            return Err(ValidationError::WrongMode(self.mode));
        }
        Ok(())
    }

    fn require_idle(&self) -> Result<(), ValidationError> {
        if self.in_flight.is_some() {
            return Err(ValidationError::RequestInFlight);
        }
        Ok(())
    }

    fn dispatch(&mut self, request: ProviderRequest) -> DispatchedCall {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        DispatchedCall {
            generation: self.generation,
            request,
        }
    }

    /// Sends raw (typed or transcribed) text off for refinement. A reply
    /// will arrive later through [`apply`](Self::apply) and become the new
    /// pending thought, replacing any unconfirmed one.
    pub fn submit_thought(&mut self, raw_text: &str) -> Result<DispatchedCall, SessionError> {
        self.require_mode(SessionMode::Guided)?;
        self.require_idle()?;
        if !is_usable_input(raw_text) {
            return Err(ValidationError::MissingInput.into());
        }
        Ok(self.dispatch(ProviderRequest::Refine {
            user_text: raw_text.trim().to_string(),
        }))
    }

    /// Records the candidate focus for the current pending thought. The
    /// question must be one of the three offered.
    pub fn select_focus(&mut self, question: &str) -> Result<(), SessionError> {
        self.require_mode(SessionMode::Guided)?;
        let pending = self
            .pending
            .as_ref()
            .ok_or(ValidationError::NoPendingThought)?;
        if !pending.challenge_questions.iter().any(|q| q == question) {
            return Err(ValidationError::UnknownQuestion.into());
        }
        self.selected_focus = Some(question.to_string());
        Ok(())
    }

    /// Promotes the pending thought plus the selected focus question into a
    /// permanent history step. Fails without mutation if either is missing.
    pub fn confirm_focus(&mut self) -> Result<ThoughtStep, SessionError> {
        self.require_mode(SessionMode::Guided)?;
        let Some(pending) = self.pending.take() else {
            return Err(ValidationError::NoPendingThought.into());
        };
        let Some(focus) = self.selected_focus.take() else {
            self.pending = Some(pending);
            return Err(ValidationError::NoFocusSelected.into());
        };
        let step = ThoughtStep {
            step: self.current_step,
            corrected_text: pending.corrected_text,
            focus_question: focus,
        };
        tracing::info!("step {} confirmed, focus: \"{}\"", step.step, step.focus_question);
        self.history.append(step.clone());
        self.current_step += 1;
        Ok(step)
    }

    /// Enters debate mode, seeding the exchange with the pending refined
    /// statement or, absent one, the most recent confirmed step. The first
    /// opponent turn is dispatched immediately; no fresh user input needed.
    pub fn start_debate(&mut self) -> Result<DispatchedCall, SessionError> {
        self.require_mode(SessionMode::Guided)?;
        self.require_idle()?;
        let argument = self
            .pending
            .as_ref()
            .map(|p| p.corrected_text.clone())
            .or_else(|| {
                self.history
                    .steps()
                    .last()
                    .map(|s| s.corrected_text.clone())
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or(ValidationError::MissingArgument)?;

        self.mode = SessionMode::Debate;
        self.pending = None;
        self.selected_focus = None;
        self.debate_turns = vec![DebateTurn::user(argument)];
        tracing::info!("entering debate mode");
        Ok(self.dispatch(ProviderRequest::Debate {
            turns: self.debate_turns.clone(),
        }))
    }

    /// Appends the user's next argument and dispatches the opponent's
    /// reply. If the previous opponent call failed, the retained user turn
    /// is replaced rather than stacked, keeping the exchange alternating.
    pub fn submit_rebuttal(&mut self, text: &str) -> Result<DispatchedCall, SessionError> {
        self.require_mode(SessionMode::Debate)?;
        self.require_idle()?;
        if !is_usable_input(text) {
            return Err(ValidationError::MissingInput.into());
        }
        if self
            .debate_turns
            .last()
            .is_some_and(|last| last.role == Role::User)
        {
            // The previous opponent call failed; drop the retained rebuttal
            // so the replacement keeps the exchange alternating.
            self.debate_turns.pop();
        }
        self.debate_turns.push(DebateTurn::user(text.trim().to_string()));
        Ok(self.dispatch(ProviderRequest::Debate {
            turns: self.debate_turns.clone(),
        }))
    }

    /// Leaves debate mode and resets the whole exploration: debate turns,
    /// confirmed history, step counter, and any pending thought are all
    /// cleared, and an in-flight opponent call is abandoned.
    pub fn end_debate(&mut self) -> Result<(), SessionError> {
        self.require_mode(SessionMode::Debate)?;
        self.mode = SessionMode::Guided;
        self.debate_turns.clear();
        self.history.clear();
        self.current_step = 1;
        self.pending = None;
        self.selected_focus = None;
        self.in_flight = None;
        tracing::info!("debate ended, session reset for a new exploration");
        Ok(())
    }

    /// Compiles the exploration so far into a transcript and dispatches the
    /// summary call. Requires at least one confirmed step or a non-empty
    /// unconfirmed refined thought.
    pub fn request_summary(&mut self) -> Result<DispatchedCall, SessionError> {
        self.require_mode(SessionMode::Guided)?;
        self.require_idle()?;
        let final_thought = self
            .pending
            .as_ref()
            .map(|p| p.corrected_text.as_str())
            .filter(|t| !t.trim().is_empty());
        if self.history.is_empty() && final_thought.is_none() {
            return Err(ValidationError::NothingToSummarize.into());
        }
        let transcript = summary_prompt(&self.history, final_thought);
        Ok(self.dispatch(ProviderRequest::Summarize { transcript }))
    }

    /// Applies a completed provider call. Replies for a generation that is
    /// no longer in flight are dropped without touching any state. A `None`
    /// result (retry budget spent) surfaces as `ProcessingFailed` and
    /// leaves the session exactly as it was before the call, except for the
    /// documented retained debate user turn.
    pub fn apply(
        &mut self,
        generation: u64,
        reply: ProviderReply,
    ) -> Result<SessionOutcome, SessionError> {
        if self.in_flight != Some(generation) {
            tracing::debug!("dropping stale provider reply for generation {generation}");
            return Ok(SessionOutcome::Stale);
        }
        self.in_flight = None;
        match reply {
            ProviderReply::Refined(Ok(Some(refined))) => {
                self.selected_focus = None;
                self.pending = Some(refined.clone());
                Ok(SessionOutcome::ThoughtRefined(refined))
            }
            ProviderReply::Rebuttal(Ok(Some(text))) => {
                self.debate_turns.push(DebateTurn::assistant(text.clone()));
                Ok(SessionOutcome::OpponentArgued(text))
            }
            ProviderReply::Summary(Ok(Some(text))) => Ok(SessionOutcome::SummaryReady(text)),
            ProviderReply::Refined(Ok(None))
            | ProviderReply::Rebuttal(Ok(None))
            | ProviderReply::Summary(Ok(None)) => Err(SessionError::ProcessingFailed),
            ProviderReply::Refined(Err(e))
            | ProviderReply::Rebuttal(Err(e))
            | ProviderReply::Summary(Err(e)) => Err(e.into()),
        }
    }
}
