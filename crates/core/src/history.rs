//! Confirmed exploration steps and the summary prompt compiled from them.

/// One confirmed exploration turn. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThoughtStep {
    /// Position in the exploration, starting at 1 and strictly increasing.
    pub step: u32,
    /// The refined statement the user confirmed.
    pub corrected_text: String,
    /// The challenge question the user chose to pursue next.
    pub focus_question: String,
}

/// Append-only record of confirmed steps. Iteration order is step
/// ascending; nothing is ever reordered or deleted except by the explicit
/// debate-exit reset on the session.
#[derive(Debug, Default)]
pub struct ThoughtHistory {
    steps: Vec<ThoughtStep>,
}

impl ThoughtHistory {
    pub(crate) fn append(&mut self, step: ThoughtStep) {
        self.steps.push(step);
    }

    pub(crate) fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn steps(&self) -> &[ThoughtStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Compiles the transcript sent with the blog instruction: one labeled
/// block per confirmed step in ascending order, then a trailing
/// "final thought" block for an unconfirmed refined statement, numbered
/// with the next unused step.
pub fn summary_prompt(history: &ThoughtHistory, final_thought: Option<&str>) -> String {
    let mut transcript = String::from("Thought Process Transcript for Blog Post:\n\n");
    for step in history.steps() {
        transcript.push_str(&format!(
            "STEP {} - Thought/Response: {}\n",
            step.step, step.corrected_text
        ));
        transcript.push_str(&format!(
            "STEP {} - Focused Question: {}\n\n",
            step.step, step.focus_question
        ));
    }
    if let Some(thought) = final_thought.filter(|t| !t.trim().is_empty()) {
        transcript.push_str(&format!(
            "STEP {} - Final Thought: {}\n",
            history.len() + 1,
            thought
        ));
    }
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(n: u32, text: &str, question: &str) -> ThoughtStep {
        ThoughtStep {
            step: n,
            corrected_text: text.to_string(),
            focus_question: question.to_string(),
        }
    }

    #[test]
    fn test_history_preserves_append_order() {
        let mut history = ThoughtHistory::default();
        assert!(history.is_empty());

        history.append(step(1, "first", "q1"));
        history.append(step(2, "second", "q2"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.steps()[0].step, 1);
        assert_eq!(history.steps()[1].step, 2);
    }

    #[test]
    fn test_summary_prompt_labels_each_step() {
        let mut history = ThoughtHistory::default();
        history.append(step(1, "People should work fewer hours.", "What about productivity?"));

        let transcript = summary_prompt(&history, None);

        assert_eq!(
            transcript,
            "Thought Process Transcript for Blog Post:\n\n\
             STEP 1 - Thought/Response: People should work fewer hours.\n\
             STEP 1 - Focused Question: What about productivity?\n\n"
        );
    }

    #[test]
    fn test_summary_prompt_appends_final_thought_with_next_step_number() {
        let mut history = ThoughtHistory::default();
        history.append(step(1, "first", "q1"));
        history.append(step(2, "second", "q2"));

        let transcript = summary_prompt(&history, Some("an unconfirmed closing idea"));

        assert!(transcript.contains("STEP 3 - Final Thought: an unconfirmed closing idea\n"));
    }

    #[test]
    fn test_summary_prompt_with_pending_thought_only() {
        let history = ThoughtHistory::default();
        let transcript = summary_prompt(&history, Some("only thought"));

        assert_eq!(
            transcript,
            "Thought Process Transcript for Blog Post:\n\n\
             STEP 1 - Final Thought: only thought\n"
        );
    }

    #[test]
    fn test_summary_prompt_ignores_blank_final_thought() {
        let mut history = ThoughtHistory::default();
        history.append(step(1, "first", "q1"));

        let transcript = summary_prompt(&history, Some("   "));

        assert!(!transcript.contains("Final Thought"));
    }
}
