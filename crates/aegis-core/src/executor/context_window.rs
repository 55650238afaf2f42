//! Context window truncation: a cheap chars-per-token heuristic, trimming
//! the middle of the conversation rather than the ends so the opening
//! framing and the most recent turns both survive.

use aegis_models::{Message, Role};

#[derive(Debug, Clone)]
pub struct ContextWindowConfig {
    pub max_tokens: usize,
    pub chars_per_token: usize,
    pub keep_first: usize,
    pub keep_last: usize,
}

impl Default for ContextWindowConfig {
    fn default() -> Self {
        Self {
            max_tokens: 6_000,
            chars_per_token: 4,
            keep_first: 2,
            keep_last: 12,
        }
    }
}

fn estimate_tokens(messages: &[Message], chars_per_token: usize) -> usize {
    let chars: usize = messages.iter().map(|m| m.content.len()).sum();
    chars / chars_per_token.max(1)
}

/// Truncate `messages` to fit `config.max_tokens`, keeping all `System`
/// messages plus the first `keep_first` and last `keep_last` remaining
/// messages, with a marker inserted where the cut happened.
pub fn truncate(messages: &[Message], config: &ContextWindowConfig) -> Vec<Message> {
    if estimate_tokens(messages, config.chars_per_token) <= config.max_tokens {
        return messages.to_vec();
    }

    let system: Vec<Message> = messages.iter().filter(|m| m.role == Role::System).cloned().collect();
    let rest: Vec<&Message> = messages.iter().filter(|m| m.role != Role::System).collect();

    if rest.len() <= config.keep_first + config.keep_last {
        let mut out = system;
        out.extend(rest.into_iter().cloned());
        return out;
    }

    let mut out = system;
    out.extend(rest.iter().take(config.keep_first).map(|m| (*m).clone()));
    out.push(Message::system("[Earlier messages truncated]"));
    out.extend(
        rest.iter()
            .skip(rest.len() - config.keep_last)
            .map(|m| (*m).clone()),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_message(role_user: bool, tag: usize) -> Message {
        let content = "x".repeat(500);
        if role_user {
            Message::user(format!("{content}-{tag}"))
        } else {
            Message::assistant(format!("{content}-{tag}"))
        }
    }

    #[test]
    fn short_conversation_is_untouched() {
        let messages = vec![Message::system("prompt"), Message::user("hi")];
        let config = ContextWindowConfig::default();
        assert_eq!(truncate(&messages, &config).len(), 2);
    }

    #[test]
    fn long_conversation_keeps_first_and_last_with_marker() {
        let mut messages = vec![Message::system("prompt")];
        for i in 0..40 {
            messages.push(long_message(i % 2 == 0, i));
        }
        let config = ContextWindowConfig {
            max_tokens: 100,
            chars_per_token: 4,
            keep_first: 2,
            keep_last: 3,
        };
        let truncated = truncate(&messages, &config);
        assert!(truncated.iter().any(|m| m.content.contains("truncated")));
        assert!(truncated.len() < messages.len());
        assert!(truncated[1].content.contains("-0"));
    }
}
