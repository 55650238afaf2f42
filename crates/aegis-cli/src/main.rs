mod cli;
mod client;
mod commands;
mod error;
mod state;

use clap::Parser;
use cli::{Cli, Commands, SessionCommands, TelemetryCommands};
use client::CoreClient;

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(level)
        .init();
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error::handle_error(err);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let client = CoreClient::new(cli.server);

    match cli.command {
        Commands::Chat {
            message,
            session_id,
            new,
            compress,
        } => commands::chat::run(&client, &message, session_id, new, compress, cli.format).await,

        Commands::Session { command } => match command {
            Some(SessionCommands::New { channel, mode }) => {
                commands::session::new_session(&client, &channel, &mode, cli.format).await
            }
            None => commands::session::show_current(&client, cli.format).await,
        },

        Commands::Telemetry { command } => match command {
            TelemetryCommands::Query { event, last } => {
                commands::telemetry::query(event.as_deref(), last.as_deref(), cli.format).await
            }
            TelemetryCommands::Trace { trace_id } => {
                commands::telemetry::trace(trace_id, cli.format).await
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_without_error() {
        Cli::command().debug_assert();
    }
}
