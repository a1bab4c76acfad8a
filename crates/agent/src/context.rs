//! Conversation context assembly.
//!
//! Completion prompts carry a short window of recent history rather than
//! the whole transcript: the last 4 turns (two user/assistant exchanges),
//! each rendered as "ROLE: content". The window includes the turn being
//! answered, since the chat surface appends the user's message before the
//! pipeline runs.

use faithloop_core::Transcript;

/// How many trailing turns feed the prompt context.
const CONTEXT_WINDOW_TURNS: usize = 4;

/// Render the trailing context window as "ROLE: content" lines.
///
/// An empty transcript yields an empty string.
pub fn assemble(transcript: &Transcript) -> String {
    let start = transcript.turns.len().saturating_sub(CONTEXT_WINDOW_TURNS);
    transcript.turns[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str().to_uppercase(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use faithloop_core::Turn;

    #[test]
    fn empty_transcript_yields_empty_string() {
        assert_eq!(assemble(&Transcript::new()), "");
    }

    #[test]
    fn renders_roles_uppercased() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("What is 2+2?"));
        transcript.push(Turn::assistant("4"));

        assert_eq!(assemble(&transcript), "USER: What is 2+2?\nASSISTANT: 4");
    }

    #[test]
    fn short_history_is_kept_whole() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("only turn"));

        assert_eq!(assemble(&transcript), "USER: only turn");
    }

    #[test]
    fn long_history_keeps_exactly_last_four_in_order() {
        let mut transcript = Transcript::new();
        for i in 1..=6 {
            let turn = if i % 2 == 1 {
                Turn::user(format!("question {i}"))
            } else {
                Turn::assistant(format!("answer {i}"))
            };
            transcript.push(turn);
        }

        let context = assemble(&transcript);
        assert_eq!(
            context,
            "USER: question 3\nASSISTANT: answer 4\nUSER: question 5\nASSISTANT: answer 6"
        );
        assert!(!context.contains("question 1"));
        assert!(!context.contains("answer 2"));
    }
}
