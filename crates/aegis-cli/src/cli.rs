//! Clap derive surface for the `agent` binary, narrowed from the teacher's
//! `restflow-cli/src/cli.rs` (30+ subcommands across a multi-channel daemon)
//! down to the five operations named in the external interfaces: chat,
//! session, session new, telemetry query, telemetry trace.

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

/// Output format for CLI commands.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Parser)]
#[command(name = "agent")]
#[command(version, about = "Aegis agent CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the aegis core's HTTP surface.
    #[arg(long, global = true, env = "AGENT_SERVICE_URL", default_value = "http://127.0.0.1:8787")]
    pub server: String,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a chat message, printing the assistant's reply.
    Chat {
        message: String,

        /// Reuse an existing session instead of the locally remembered one.
        #[arg(long)]
        session_id: Option<Uuid>,

        /// Start a brand new session, ignoring any remembered session id.
        #[arg(long)]
        new: bool,

        /// Summarise and clear the session's transcript before this turn.
        #[arg(long)]
        compress: bool,
    },

    /// Session inspection and creation.
    Session {
        #[command(subcommand)]
        command: Option<SessionCommands>,
    },

    /// Telemetry log inspection.
    Telemetry {
        #[command(subcommand)]
        command: TelemetryCommands,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Create a new session and remember it as the current one.
    New {
        #[arg(long, default_value = "CLI")]
        channel: String,

        #[arg(long, default_value = "NORMAL")]
        mode: String,
    },
}

#[derive(Subcommand)]
pub enum TelemetryCommands {
    /// Filter the local telemetry log by event name and/or a trailing time
    /// window (e.g. `--last=1h`, `--last=30m`, `--last=2d`).
    Query {
        #[arg(long = "event")]
        event: Option<String>,

        #[arg(long = "last")]
        last: Option<String>,
    },

    /// Print every event recorded under one trace id, in span order.
    Trace { trace_id: Uuid },
}
