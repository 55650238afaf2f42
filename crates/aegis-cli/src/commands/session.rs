//! `agent session` (show the current session) and `agent session new`.
//! Generalises the teacher's `restflow-cli/src/commands/session.rs`
//! `show_session`/`create_session` pair, narrowed to the two operations the
//! interface names — no list/delete/search, since nothing backs those here.

use serde_json::json;

use crate::cli::OutputFormat;
use crate::client::CoreClient;
use crate::state;

pub async fn new_session(
    client: &CoreClient,
    channel: &str,
    mode: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let session = client.create_session(channel, mode).await?;
    state::remember_session_id(session.session_id)?;

    if format.is_json() {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "session_id": session.session_id,
                "channel": session.channel,
                "mode": session.mode,
                "created_at": session.created_at,
            }))?
        );
        return Ok(());
    }

    println!("Created session: {}", session.session_id);
    Ok(())
}

pub async fn show_current(client: &CoreClient, format: OutputFormat) -> anyhow::Result<()> {
    let Some(session_id) = state::current_session_id() else {
        anyhow::bail!("no current session; run `agent session new` first");
    };

    let session = client.get_session(session_id).await?;

    if format.is_json() {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "session_id": session.session_id,
                "channel": session.channel,
                "mode": session.mode,
                "created_at": session.created_at,
                "messages": session.messages,
            }))?
        );
        return Ok(());
    }

    println!("Session: {} ({})", session.channel, session.session_id);
    println!("Mode: {}", session.mode);
    println!("Messages: {}", session.messages.len());
    println!();
    for message in &session.messages {
        let role = message.get("role").and_then(|v| v.as_str()).unwrap_or("?");
        let content = message
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        println!("{role}");
        println!("{content}");
        println!();
    }
    Ok(())
}
