//! Error types for the exploration engine.

use crate::session::SessionMode;

/// Caller mistakes. Surfaced synchronously: no network call is made and no
/// session state is mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("input is empty or still the placeholder text")]
    MissingInput,
    #[error("a provider call is already in flight for this session")]
    RequestInFlight,
    #[error("no refined thought is awaiting a focus selection")]
    NoPendingThought,
    #[error("the selected question is not one of the offered challenges")]
    UnknownQuestion,
    #[error("a focus question must be selected before confirming")]
    NoFocusSelected,
    #[error("operation is not available in {0} mode")]
    WrongMode(SessionMode),
    #[error("a debate needs a non-empty refined statement to argue")]
    MissingArgument,
    #[error("at least one processed thought is needed before a summary")]
    NothingToSummarize,
}

/// Missing provider credentials. Surfaced immediately, never retried, and
/// no request is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("provider API key is missing")]
    MissingApiKey,
}

/// Errors surfaced by session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The provider produced no usable result within the retry budget. The
    /// session is left exactly as it was before the call, so the caller may
    /// simply resubmit.
    #[error("the provider returned no usable result after all retries")]
    ProcessingFailed,
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::MissingInput;
        assert_eq!(err.to_string(), "input is empty or still the placeholder text");

        let err = ValidationError::WrongMode(SessionMode::Debate);
        assert_eq!(err.to_string(), "operation is not available in debate mode");

        let err = SessionError::from(ValidationError::NoFocusSelected);
        assert_eq!(
            err.to_string(),
            "a focus question must be selected before confirming"
        );

        let err = SessionError::ProcessingFailed;
        assert_eq!(
            err.to_string(),
            "the provider returned no usable result after all retries"
        );

        let err = ClientError::MissingApiKey;
        assert_eq!(err.to_string(), "provider API key is missing");
    }
}
