//! Error rendering and exit codes for the `agent` binary. Generalises the
//! teacher's `restflow-cli/src/error.rs`: same colored "Error:" banner plus
//! keyword-triggered suggestion blocks, narrowed to the failures this
//! narrower CLI can actually hit (connection, 4xx/5xx, parse).

use colored::Colorize;

const SUGGESTION_HEADER: &str = "Suggestion:";

/// Exit codes named in §6: 0 is reserved for success by the caller.
pub const EXIT_CONNECTION: i32 = 2;
pub const EXIT_CLIENT_ERROR: i32 = 3;
pub const EXIT_SERVER_ERROR: i32 = 4;
pub const EXIT_PARSE_FAILURE: i32 = 5;
pub const EXIT_GENERIC: i32 = 1;

fn suggestions_for_message(msg: &str) -> Vec<Vec<String>> {
    let lower = msg.to_lowercase();
    let mut blocks = Vec::new();

    if lower.contains("connection refused") || lower.contains("error sending request") {
        blocks.push(vec![
            "Is the core running? Start it with:".to_string(),
            format!("{} aegisd", "$".dimmed()),
        ]);
    }

    if lower.contains("session not found") || lower.contains("404") {
        blocks.push(vec![
            "Start a new session with:".to_string(),
            format!("{} agent session new", "$".dimmed()),
        ]);
    }

    if lower.contains("message must not be empty") {
        blocks.push(vec!["Pass a non-empty message to chat.".to_string()]);
    }

    blocks
}

/// Classify an error's message into one of the exit codes above. Message
/// sniffing rather than a typed error because the failure crosses a process
/// boundary (reqwest status, JSON decode, or a plain connection error) and
/// this CLI has no reason to carry that structure any further than here.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = err.to_string().to_lowercase();
    if msg.contains("connection refused") || msg.contains("error sending request") {
        EXIT_CONNECTION
    } else if msg.contains("400") || msg.contains("404") || msg.contains("422") {
        EXIT_CLIENT_ERROR
    } else if msg.contains("500") || msg.contains("502") || msg.contains("503") {
        EXIT_SERVER_ERROR
    } else if msg.contains("parse") || msg.contains("decode") || msg.contains("invalid json") {
        EXIT_PARSE_FAILURE
    } else {
        EXIT_GENERIC
    }
}

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    for lines in suggestions_for_message(&err.to_string()) {
        eprintln!("\n{}", SUGGESTION_HEADER.yellow().bold());
        for line in lines {
            eprintln!("  {}", line);
        }
    }

    std::process::exit(exit_code_for(&err));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_starting_the_daemon_on_connection_refused() {
        let suggestions = suggestions_for_message("connection refused (os error 61)");
        let joined = suggestions
            .iter()
            .flat_map(|block| block.iter())
            .cloned()
            .collect::<Vec<String>>()
            .join("\n");
        assert!(joined.contains("agentd") || joined.contains("aegisd"));
    }

    #[test]
    fn suggests_session_new_on_missing_session() {
        let suggestions = suggestions_for_message("session not found");
        let joined = suggestions
            .iter()
            .flat_map(|block| block.iter())
            .cloned()
            .collect::<Vec<String>>()
            .join("\n");
        assert!(joined.contains("agent session new"));
    }

    #[test]
    fn no_suggestion_for_unrelated_error() {
        assert!(suggestions_for_message("unexpected parse error").is_empty());
    }

    #[test]
    fn classifies_connection_errors() {
        let err = anyhow::anyhow!("error sending request for url (http://127.0.0.1:8787/chat)");
        assert_eq!(exit_code_for(&err), EXIT_CONNECTION);
    }

    #[test]
    fn classifies_client_errors() {
        let err = anyhow::anyhow!("request failed: 404 Not Found");
        assert_eq!(exit_code_for(&err), EXIT_CLIENT_ERROR);
    }

    #[test]
    fn classifies_server_errors() {
        let err = anyhow::anyhow!("request failed: 502 Bad Gateway");
        assert_eq!(exit_code_for(&err), EXIT_SERVER_ERROR);
    }

    #[test]
    fn falls_back_to_generic_exit_code() {
        let err = anyhow::anyhow!("something unexpected happened");
        assert_eq!(exit_code_for(&err), EXIT_GENERIC);
    }
}
