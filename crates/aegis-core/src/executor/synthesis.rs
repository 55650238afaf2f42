//! The fallback synthesiser: when the closing LLM call that's supposed to
//! turn gathered tool output into a reply fails (upstream unavailable,
//! malformed response), produce a plain-text summary directly from the
//! tool results already in hand rather than failing the whole request.

use aegis_models::{Message, Role};

pub fn synthesize_from_transcript(messages: &[Message]) -> String {
    let tool_outputs: Vec<&Message> = messages.iter().filter(|m| m.role == Role::Tool).collect();

    if tool_outputs.is_empty() {
        return "I wasn't able to reach the language model to finish this response.".to_string();
    }

    let mut summary = String::from("I couldn't reach the language model to write a full reply, but here's what the tools returned:\n");
    for output in tool_outputs {
        let snippet: String = output.content.chars().take(400).collect();
        summary.push_str("- ");
        summary.push_str(&snippet);
        summary.push('\n');
    }
    summary
}
