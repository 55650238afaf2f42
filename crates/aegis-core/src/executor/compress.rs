//! Session compaction for the `compress=true` chat request: collapse the
//! existing transcript down to one summary message and drop the rest.
//! This is summarise-and-clear only, as scoped — no sliding window, no
//! periodic re-compaction, no further heuristics layered on top.

use aegis_models::{Message, Role};

const MAX_SUMMARY_CHARS: usize = 2000;
const MAX_TURN_CHARS: usize = 200;

/// Replace `messages` with a single system message summarising them, or
/// return the input unchanged if there's nothing worth summarising.
pub fn compress_transcript(messages: Vec<Message>) -> Vec<Message> {
    let turns: Vec<&Message> = messages
        .iter()
        .filter(|m| matches!(m.role, Role::User | Role::Assistant) && !m.content.trim().is_empty())
        .collect();

    if turns.len() < 2 {
        return messages;
    }

    let mut summary = String::from("Summary of the conversation so far:\n");
    for turn in &turns {
        let speaker = match turn.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
            _ => continue,
        };
        summary.push_str("- ");
        summary.push_str(speaker);
        summary.push_str(": ");
        summary.extend(turn.content.chars().take(MAX_TURN_CHARS));
        summary.push('\n');
        if summary.len() >= MAX_SUMMARY_CHARS {
            break;
        }
    }
    summary.truncate(MAX_SUMMARY_CHARS);

    vec![Message::system(summary)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_history_is_left_untouched() {
        let messages = vec![Message::user("hi")];
        let compressed = compress_transcript(messages);
        assert_eq!(compressed.len(), 1);
        assert_eq!(compressed[0].role, Role::User);
    }

    #[test]
    fn multi_turn_history_collapses_to_one_message() {
        let messages = vec![
            Message::user("what's the weather"),
            Message::assistant("I can't check that"),
            Message::user("ok thanks"),
        ];
        let compressed = compress_transcript(messages);
        assert_eq!(compressed.len(), 1);
        assert_eq!(compressed[0].role, Role::System);
        assert!(compressed[0].content.contains("User: what's the weather"));
    }

    #[test]
    fn empty_history_is_left_untouched() {
        let compressed = compress_transcript(vec![]);
        assert!(compressed.is_empty());
    }
}
