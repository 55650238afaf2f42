//! The CLI's only local state: which session `agent chat`/`agent session`
//! operate on when the caller doesn't pass `--session-id` explicitly.
//! Mirrors the teacher's `config/cli_config.rs` "load, mutate, save back to
//! one JSON file under the data dir" shape, narrowed to a single field.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn state_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("aegis")
        .join("cli")
        .join("state.json")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CliState {
    current_session_id: Option<Uuid>,
}

fn load() -> CliState {
    let path = state_path();
    std::fs::read_to_string(&path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn save(state: &CliState) -> anyhow::Result<()> {
    let path = state_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(state)?)?;
    Ok(())
}

pub fn current_session_id() -> Option<Uuid> {
    load().current_session_id
}

pub fn remember_session_id(session_id: Uuid) -> anyhow::Result<()> {
    save(&CliState {
        current_session_id: Some(session_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_has_no_current_session() {
        assert_eq!(CliState::default().current_session_id, None);
    }
}
