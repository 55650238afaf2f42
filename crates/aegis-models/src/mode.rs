//! Operational mode state machine data types.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// One of the five operational modes governing what the agent may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Normal,
    Alert,
    Degraded,
    Lockdown,
    Recovery,
}

impl Mode {
    /// The next stricter mode on the escalation ladder, if any.
    pub fn stricter(self) -> Option<Mode> {
        match self {
            Mode::Normal => Some(Mode::Alert),
            Mode::Alert => Some(Mode::Degraded),
            Mode::Degraded => Some(Mode::Lockdown),
            Mode::Lockdown => None,
            Mode::Recovery => None,
        }
    }

    /// The next looser mode on the recovery ladder, if any.
    pub fn looser(self) -> Option<Mode> {
        match self {
            Mode::Lockdown => Some(Mode::Degraded),
            Mode::Degraded => Some(Mode::Alert),
            Mode::Alert => Some(Mode::Recovery),
            Mode::Recovery => Some(Mode::Normal),
            Mode::Normal => None,
        }
    }
}

/// Per-mode resource thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeThresholds {
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
    pub disk_percent: Option<f64>,
    pub gpu_percent: Option<f64>,
}

/// A loaded mode definition: thresholds that trigger entry, how long a
/// violation must be sustained, and which transitions are legal from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeDefinition {
    pub mode: Mode,
    pub thresholds: ModeThresholds,
    pub sustained_seconds: u64,
    pub allowed_transitions: BTreeSet<Mode>,
}

/// The full table of mode definitions, keyed by mode, loaded once from
/// policy at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeDefinitionTable(pub HashMap<Mode, ModeDefinition>);

impl ModeDefinitionTable {
    pub fn get(&self, mode: Mode) -> Option<&ModeDefinition> {
        self.0.get(&mode)
    }

    pub fn allows_transition(&self, from: Mode, to: Mode) -> bool {
        self.0
            .get(&from)
            .map(|def| def.allowed_transitions.contains(&to))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stricter_ladder_escalates() {
        assert_eq!(Mode::Normal.stricter(), Some(Mode::Alert));
        assert_eq!(Mode::Alert.stricter(), Some(Mode::Degraded));
        assert_eq!(Mode::Degraded.stricter(), Some(Mode::Lockdown));
        assert_eq!(Mode::Lockdown.stricter(), None);
    }

    #[test]
    fn looser_ladder_recovers() {
        assert_eq!(Mode::Lockdown.looser(), Some(Mode::Degraded));
        assert_eq!(Mode::Recovery.looser(), Some(Mode::Normal));
        assert_eq!(Mode::Normal.looser(), None);
    }
}
