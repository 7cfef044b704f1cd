//! System instructions and the structured response schema sent to the
//! generation service.

/// Instruction for the structured refinement call: clean up the raw
/// transcription and produce exactly three challenge questions.
pub const THOUGHT_COACH_INSTRUCTION: &str = "You are a world-class language tutor and deep-thinking coach. \
     Your primary task is two-fold. \
     First, take the raw, error-prone user transcription, correct all grammatical errors, smooth out \
     pauses, filler words, and repetitions, and output it as clear, coherent, formal English text. \
     Second, based *only* on the refined text, generate precisely 3 unique, thought-provoking questions. \
     These questions must challenge the core assumption, explore the central idea's consequences, or push \
     the user to consider the opposite perspective.";

/// Instruction for the summary call over the compiled transcript.
pub const BLOG_INSTRUCTION: &str = "You are a skilled content creator. Take the provided thought process, which is a sequence of initial thought and responses to challenge questions. \
     Write a concise, engaging, and reflective blog post (3-4 paragraphs) that summarizes the core idea and the journey of exploration the user took. \
     Use a positive and encouraging tone, suitable for a young audience, avoiding complex jargon. \
     Format the output as clear, clean text.";

/// Instruction for the devil's-advocate persona in debate mode.
pub const DEBATE_INSTRUCTION: &str = "You are a skilled, highly intellectual devil's advocate. Your role is to debate the user's stance. \
     Analyze the user's previous statement or argument. Generate a concise, intellectual, and challenging counter-argument or rebuttal. \
     Do not agree with the user. Your response must continue the debate. \
     Keep your response focused and always end by prompting the user for their next point. \
     Maintain the persona of a rigorous academic opponent. Respond in plain text only.";

/// The response schema attached to structured refinement requests. The
/// provider must return `corrected_text` plus `challenge_questions`, and a
/// reply with any arity other than three questions fails parsing on our
/// side regardless of what the provider claims.
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "corrected_text": {
                "type": "STRING",
                "description": "The cleaned, grammatically correct, and formal English version of the user's raw speech transcription."
            },
            "challenge_questions": {
                "type": "ARRAY",
                "description": "A list of exactly three thought-provoking questions designed to challenge the main assumption or explore the core idea of the corrected text further.",
                "items": { "type": "STRING" }
            }
        },
        "required": ["corrected_text", "challenge_questions"],
        "propertyOrdering": ["corrected_text", "challenge_questions"]
    })
}
