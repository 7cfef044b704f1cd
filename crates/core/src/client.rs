//! Resilient client for the text-generation service.
//!
//! Wraps the provider's `generateContent` contract behind the
//! [`GenerateApi`] trait: one structured single-turn operation and one
//! free-form multi-turn operation, both with a shared retry/backoff policy.
//! Transient failures (transport errors, bad status, empty or malformed
//! payloads) never escape this module; a call that exhausts its budget
//! simply yields `None` and the caller decides what to report.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ClientError;
use crate::prompts;
use crate::session::DebateTurn;

/// Base URL of the generation service.
const API_URL_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Attempt budget for each call.
pub const MAX_RETRIES: u32 = 5;

/// A structured reply must carry exactly this many challenge questions;
/// anything else is a contract violation and fails the attempt.
pub const CHALLENGE_QUESTION_COUNT: usize = 3;

/// The provider's reply to a structured refinement request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructuredReply {
    pub corrected_text: String,
    pub challenge_questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()
            .map(|part| part.text)
    }
}

/// Why a single attempt failed. Internal to the retry loop: every variant
/// is transient and collapses to `None` once the budget is spent.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("response carried no text payload")]
    EmptyPayload,
    #[error("malformed reply: {0}")]
    Parse(String),
}

/// Contract for the text-generation service. The session engine and the
/// runtime depend on this abstraction rather than a concrete client, so
/// unit tests can drive every flow with `mockall`'s generated mock instead
/// of the network.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait GenerateApi {
    /// Single-turn structured refinement. `Ok(None)` means the retry budget
    /// was exhausted without a usable reply.
    async fn invoke_structured(
        &self,
        user_text: &str,
        system_instruction: &str,
    ) -> Result<Option<StructuredReply>, ClientError>;

    /// Multi-turn chat over the full ordered turn list, returning free-form
    /// text. Same retry and `Ok(None)`-on-exhaustion contract.
    async fn invoke_chat(
        &self,
        turns: &[DebateTurn],
        system_instruction: &str,
    ) -> Result<Option<String>, ClientError>;
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{API_URL_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        )
    }

    fn require_key(&self) -> Result<(), ClientError> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::MissingApiKey);
        }
        Ok(())
    }

    /// One outbound request; returns the first candidate's text.
    async fn post_for_text(&self, payload: &serde_json::Value) -> Result<String, AttemptError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        let body: GenerateResponse = response.json().await?;
        body.into_text().ok_or(AttemptError::EmptyPayload)
    }
}

#[async_trait]
impl GenerateApi for GeminiClient {
    async fn invoke_structured(
        &self,
        user_text: &str,
        system_instruction: &str,
    ) -> Result<Option<StructuredReply>, ClientError> {
        self.require_key()?;
        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": user_text }] }],
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": prompts::response_schema(),
            }
        });
        let payload = &payload;
        Ok(retry_with_backoff(MAX_RETRIES, || async move {
            let text = self.post_for_text(payload).await?;
            parse_structured_reply(&text)
        })
        .await)
    }

    async fn invoke_chat(
        &self,
        turns: &[DebateTurn],
        system_instruction: &str,
    ) -> Result<Option<String>, ClientError> {
        self.require_key()?;
        let contents: Vec<serde_json::Value> = turns
            .iter()
            .map(|turn| {
                serde_json::json!({
                    "role": turn.role.as_str(),
                    "parts": [{ "text": turn.text }],
                })
            })
            .collect();
        let payload = serde_json::json!({
            "contents": contents,
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
        });
        let payload = &payload;
        Ok(retry_with_backoff(MAX_RETRIES, || async move {
            self.post_for_text(payload).await
        })
        .await)
    }
}

fn parse_structured_reply(text: &str) -> Result<StructuredReply, AttemptError> {
    let reply: StructuredReply =
        serde_json::from_str(text).map_err(|e| AttemptError::Parse(e.to_string()))?;
    if reply.challenge_questions.len() != CHALLENGE_QUESTION_COUNT {
        return Err(AttemptError::Parse(format!(
            "expected {} challenge questions, got {}",
            CHALLENGE_QUESTION_COUNT,
            reply.challenge_questions.len()
        )));
    }
    Ok(reply)
}

/// Runs `attempt` up to `max_attempts` times, sleeping `2^n` seconds after
/// the n-th failure (1, 2, 4, 8, 16). Any success short-circuits the loop;
/// exhaustion yields `None`.
async fn retry_with_backoff<T, F, Fut>(max_attempts: u32, mut attempt: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    for n in 0..max_attempts {
        match attempt().await {
            Ok(value) => return Some(value),
            Err(e) => {
                tracing::warn!("provider attempt {}/{} failed: {}", n + 1, max_attempts, e);
                tokio::time::sleep(Duration::from_secs(1u64 << n)).await;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{DEBATE_INSTRUCTION, THOUGHT_COACH_INSTRUCTION};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_backoff_sequence_after_each_failure() {
        let mut attempts = 0u32;
        let started = Instant::now();

        let result: Option<()> = retry_with_backoff(MAX_RETRIES, || {
            attempts += 1;
            async { Err(AttemptError::EmptyPayload) }
        })
        .await;

        assert!(result.is_none(), "exhausted retries must yield None");
        assert_eq!(attempts, 5, "the budget is exactly five attempts");
        // 1 + 2 + 4 + 8 + 16 seconds of virtual time, one sleep per failure.
        assert_eq!(started.elapsed(), Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_short_circuits_remaining_attempts() {
        let mut attempts = 0u32;
        let started = Instant::now();

        let result = retry_with_backoff(MAX_RETRIES, || {
            attempts += 1;
            let n = attempts;
            async move {
                if n < 3 {
                    Err(AttemptError::EmptyPayload)
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Some(3));
        assert_eq!(attempts, 3);
        // Only the two failed attempts slept: 1s + 2s.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn test_parse_accepts_exactly_three_questions() {
        let reply = parse_structured_reply(
            r#"{"corrected_text": "People should work fewer hours.",
                "challenge_questions": ["q1", "q2", "q3"]}"#,
        )
        .expect("three questions should parse");
        assert_eq!(reply.corrected_text, "People should work fewer hours.");
        assert_eq!(reply.challenge_questions.len(), 3);
    }

    #[test]
    fn test_parse_rejects_wrong_question_count() {
        let result = parse_structured_reply(
            r#"{"corrected_text": "x", "challenge_questions": ["q1", "q2"]}"#,
        );
        assert!(matches!(result, Err(AttemptError::Parse(_))));

        let result = parse_structured_reply(
            r#"{"corrected_text": "x", "challenge_questions": ["q1", "q2", "q3", "q4"]}"#,
        );
        assert!(matches!(result, Err(AttemptError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_missing_fields_and_junk() {
        assert!(parse_structured_reply(r#"{"corrected_text": "x"}"#).is_err());
        assert!(parse_structured_reply("not json at all").is_err());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_any_attempt() {
        let client = GeminiClient::new(String::new(), "gemini-test".to_string());

        let err = client
            .invoke_structured("some thought", THOUGHT_COACH_INSTRUCTION)
            .await
            .expect_err("an empty key must fail fast");
        assert_eq!(err, ClientError::MissingApiKey);

        let err = client
            .invoke_chat(&[DebateTurn::user("some argument")], DEBATE_INSTRUCTION)
            .await
            .expect_err("an empty key must fail fast");
        assert_eq!(err, ClientError::MissingApiKey);
    }

    // Live integration test against the real provider. Ignored by default
    // so `cargo test` runs without credentials; run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_live_refinement_returns_three_questions() {
        dotenvy::dotenv_override().ok();
        let api_key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY not set");
        let client = GeminiClient::new(api_key, "gemini-2.5-flash-preview-05-20".to_string());

        let reply = client
            .invoke_structured(
                "I think, uh, maybe all people should like, you know, work less time",
                THOUGHT_COACH_INSTRUCTION,
            )
            .await
            .expect("credentials are present")
            .expect("provider should produce a reply");

        assert!(!reply.corrected_text.is_empty());
        assert_eq!(reply.challenge_questions.len(), 3);
    }
}
