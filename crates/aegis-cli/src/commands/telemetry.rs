//! `agent telemetry query --event=X --last=1h` and
//! `agent telemetry trace <trace_id>`. Reads the core's own newline-delimited
//! telemetry log directly off disk (there is no HTTP endpoint for this in
//! §6) rather than going through the core's HTTP surface, the same way the
//! teacher's TUI (`tui/history.rs`) reads session history straight out of
//! local storage instead of round-tripping an API for it.

use std::path::{Path, PathBuf};

use aegis_models::TelemetryEvent;
use chrono::{Duration, Utc};
use colored::Colorize;
use uuid::Uuid;

use crate::cli::OutputFormat;

fn telemetry_dir() -> PathBuf {
    aegis_core::config::AppConfig::from_env().resolved_telemetry_dir()
}

/// Rotated log files oldest-to-newest: `events.jsonl.N`, ..., `events.jsonl.1`,
/// `events.jsonl` — matching `JsonlSink`'s rename-on-rotate scheme where
/// `.1` is always the most recently rotated-out file.
fn log_files_oldest_first(dir: &Path) -> Vec<PathBuf> {
    let base = dir.join("events.jsonl");
    let mut backups = Vec::new();
    let mut n = 1;
    loop {
        let path = dir.join(format!("events.jsonl.{n}"));
        if !path.exists() {
            break;
        }
        backups.push(path);
        n += 1;
    }
    backups.reverse();
    if base.exists() {
        backups.push(base);
    }
    backups
}

fn read_events(dir: &Path) -> Vec<TelemetryEvent> {
    let mut events = Vec::new();
    for path in log_files_oldest_first(dir) {
        let Ok(contents) = std::fs::read_to_string(&path) else {
            continue;
        };
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(event) = serde_json::from_str::<TelemetryEvent>(line) {
                events.push(event);
            }
        }
    }
    events
}

/// Parses a trailing-window duration like `1h`, `30m`, `2d`, `45s`.
fn parse_window(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let (number, unit) = raw.split_at(raw.len().saturating_sub(1));
    let amount: i64 = number
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration '{raw}', expected e.g. '1h', '30m'"))?;
    match unit {
        "s" => Ok(Duration::seconds(amount)),
        "m" => Ok(Duration::minutes(amount)),
        "h" => Ok(Duration::hours(amount)),
        "d" => Ok(Duration::days(amount)),
        _ => Err(anyhow::anyhow!(
            "invalid duration unit in '{raw}', expected one of s/m/h/d"
        )),
    }
}

fn print_events(events: &[TelemetryEvent], format: OutputFormat) -> anyhow::Result<()> {
    if format.is_json() {
        println!("{}", serde_json::to_string_pretty(events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("no matching telemetry events");
        return Ok(());
    }

    for event in events {
        let level = format!("{:?}", event.level).to_uppercase();
        println!(
            "{} {} {} {}",
            event.timestamp.to_rfc3339().dimmed(),
            level,
            event.event_name.bold(),
            event.trace_id
        );
        for (key, value) in &event.fields {
            println!("    {key}={value}");
        }
    }
    Ok(())
}

pub async fn query(
    event: Option<&str>,
    last: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let cutoff = last.map(parse_window).transpose()?.map(|window| Utc::now() - window);

    let events: Vec<TelemetryEvent> = read_events(&telemetry_dir())
        .into_iter()
        .filter(|e| event.is_none_or(|name| e.event_name == name))
        .filter(|e| cutoff.is_none_or(|cutoff| e.timestamp >= cutoff))
        .collect();

    print_events(&events, format)
}

pub async fn trace(trace_id: Uuid, format: OutputFormat) -> anyhow::Result<()> {
    let events: Vec<TelemetryEvent> = read_events(&telemetry_dir())
        .into_iter()
        .filter(|e| e.trace_id == trace_id)
        .collect();

    if events.is_empty() {
        anyhow::bail!("no telemetry events recorded for trace {trace_id}");
    }

    print_events(&events, format)
}
