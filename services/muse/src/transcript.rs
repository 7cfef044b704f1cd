//! Boundary to the speech-capture collaborator.
//!
//! Recording, streaming, and the speech-to-text engine are not implemented
//! here; this module fixes the contract an implementation must meet and
//! turns delivered outcomes into something the control loop can act on.

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

/// Result of one recording session. Exactly one outcome is delivered per
/// recording, asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptOutcome {
    /// The recording produced usable text.
    Success(String),
    /// The audio could not be understood.
    Unknown,
    /// The transcription service could not be reached.
    RequestFailed(String),
    /// Any other capture failure.
    Failed(String),
}

/// Contract for a speech-capture implementation: record until the interval
/// elapses (or the utterance ends) and deliver exactly one outcome on the
/// channel.
#[async_trait]
pub trait TranscriptIngester {
    async fn record(&self, seconds: u64, outcomes: Sender<TranscriptOutcome>);
}

/// Splits an outcome into text to submit for refinement (if any) and the
/// status line to show the user.
pub fn triage(outcome: TranscriptOutcome) -> (Option<String>, String) {
    match outcome {
        TranscriptOutcome::Success(text) => (Some(text), "Transcription ready.".to_string()),
        TranscriptOutcome::Unknown => (None, "Could not understand the audio.".to_string()),
        TranscriptOutcome::RequestFailed(detail) => {
            (None, format!("Speech service unavailable: {detail}"))
        }
        TranscriptOutcome::Failed(detail) => (None, format!("Recording failed: {detail}")),
    }
}
