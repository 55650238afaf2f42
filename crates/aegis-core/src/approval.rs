//! The single approval channel this service runs today: a blocking stdin
//! prompt, per the resolved scope (DESIGN.md) — a push/web approval queue
//! is future work the `ApprovalChannel` trait already leaves room for.
//! No teacher code prompts over stdin directly; this follows the async
//! `tokio::select!`-with-timeout idiom the teacher uses for every other
//! cancellable wait (`daemon/supervisor.rs`).

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use aegis_traits::{ApprovalChannel, ApprovalOutcome, Result, ToolAction, TraitError};

#[derive(Debug, Default)]
pub struct ConsoleApprovalChannel;

#[async_trait]
impl ApprovalChannel for ConsoleApprovalChannel {
    async fn request_approval(
        &self,
        action: &ToolAction,
        reason: Option<&str>,
        timeout_seconds: u64,
    ) -> Result<ApprovalOutcome> {
        println!(
            "\napproval required: {} wants to {} {}",
            action.tool_name, action.operation, action.target
        );
        if let Some(reason) = reason {
            println!("reason: {reason}");
        }
        print!("allow? [y/N]: ");
        use std::io::Write;
        let _ = std::io::stdout().flush();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let wait = tokio::time::timeout(
            std::time::Duration::from_secs(timeout_seconds),
            lines.next_line(),
        );

        match wait.await {
            Ok(Ok(Some(line))) => {
                let answer = line.trim().to_lowercase();
                if answer == "y" || answer == "yes" {
                    Ok(ApprovalOutcome::Approved)
                } else {
                    Ok(ApprovalOutcome::Denied)
                }
            }
            Ok(Ok(None)) => Ok(ApprovalOutcome::Denied),
            Ok(Err(err)) => Err(TraitError::ApprovalUnavailable(err.to_string())),
            Err(_) => Ok(ApprovalOutcome::TimedOut),
        }
    }
}
