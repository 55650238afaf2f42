//! `agent chat "message" [--session-id X] [--new] [--compress]`.

use colored::Colorize;
use serde_json::json;
use uuid::Uuid;

use crate::cli::OutputFormat;
use crate::client::CoreClient;
use crate::state;

pub async fn run(
    client: &CoreClient,
    message: &str,
    session_id: Option<Uuid>,
    new: bool,
    compress: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if message.trim().is_empty() {
        anyhow::bail!("message must not be empty");
    }

    let resolved_session_id = if new {
        None
    } else {
        session_id.or_else(state::current_session_id)
    };

    let response = client.chat(message, resolved_session_id, compress).await?;
    state::remember_session_id(response.session_id)?;

    if format.is_json() {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "session_id": response.session_id,
                "response": response.response,
                "trace_id": response.trace_id,
                "usage": response.usage,
            }))?
        );
        return Ok(());
    }

    println!("{}", response.response);
    println!(
        "{} {}",
        "trace:".dimmed(),
        response.trace_id.to_string().dimmed()
    );
    Ok(())
}
