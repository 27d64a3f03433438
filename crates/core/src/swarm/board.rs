//! # Agent Status Board
//!
//! Per-agent status shown to the UI. Serializes as a flat map keyed by
//! agent role, in a fixed order.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::skills::AgentRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    #[default]
    Idle,
    Initializing,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStatusBoard {
    slots: [(AgentRole, AgentState); 8],
}

impl Default for AgentStatusBoard {
    fn default() -> Self {
        Self::filled(AgentState::Idle)
    }
}

impl AgentStatusBoard {
    /// Every agent in the same state
    pub fn filled(state: AgentState) -> Self {
        Self {
            slots: AgentRole::all().map(|role| (role, state)),
        }
    }

    pub fn get(&self, role: AgentRole) -> AgentState {
        self.iter()
            .find(|(r, _)| *r == role)
            .map(|(_, s)| s)
            .unwrap_or_default()
    }

    pub fn set(&mut self, role: AgentRole, state: AgentState) {
        if let Some(slot) = self.slots.iter_mut().find(|(r, _)| *r == role) {
            slot.1 = state;
        }
    }

    pub fn set_all(&mut self, state: AgentState) {
        for slot in &mut self.slots {
            slot.1 = state;
        }
    }

    pub fn active(&self) -> Vec<AgentRole> {
        self.iter()
            .filter(|(_, s)| *s == AgentState::Active)
            .map(|(r, _)| r)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentRole, AgentState)> + '_ {
        self.slots.iter().copied()
    }
}

impl Serialize for AgentStatusBoard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for (role, state) in self.iter() {
            map.serialize_entry(role.key(), &state)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut board = AgentStatusBoard::default();
        assert_eq!(board.get(AgentRole::Browser), AgentState::Idle);

        board.set(AgentRole::Browser, AgentState::Active);
        board.set(AgentRole::Tech, AgentState::Active);
        assert_eq!(board.active(), vec![AgentRole::Browser, AgentRole::Tech]);

        board.set_all(AgentState::Initializing);
        assert!(board.iter().all(|(_, s)| s == AgentState::Initializing));
    }

    #[test]
    fn test_serializes_in_role_order() {
        let json = serde_json::to_string(&AgentStatusBoard::default()).unwrap();
        assert!(json.starts_with("{\"inventory\":\"idle\",\"dietary\":\"idle\""));
        assert!(json.ends_with("\"finance\":\"idle\"}"));
    }
}
