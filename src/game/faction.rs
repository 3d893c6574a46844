//! Factions: the players and autonomous actors of a game.

use serde::{Deserialize, Serialize};

/// A player or NPC faction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub num: u32,
    pub name: String,
    /// Autonomous factions are never asked for orders.
    pub is_npc: bool,
    /// Cleared when the faction dies; purged at end of turn.
    pub exists: bool,
    /// Set by a QUIT order or by inactivity removal.
    pub quit: bool,
    /// Turn number of the last orders submission.
    pub last_orders: u32,
    /// Silver reserve withdrawable by the faction's units.
    pub unclaimed: i64,
    /// Per-turn report lines: things that happened to the faction.
    #[serde(default)]
    pub events: Vec<String>,
    /// Per-turn report lines: problems with the faction's orders.
    #[serde(default)]
    pub errors: Vec<String>,
}

impl Faction {
    pub fn new(num: u32, name: impl Into<String>, is_npc: bool) -> Faction {
        Faction {
            num,
            name: name.into(),
            is_npc,
            exists: true,
            quit: false,
            last_orders: 0,
            unclaimed: 0,
            events: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn event(&mut self, message: impl Into<String>) {
        self.events.push(message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Drops last turn's report lines at the start of a new turn.
    pub fn clear_diagnostics(&mut self) {
        self.events.clear();
        self.errors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_faction_exists_and_has_no_diagnostics() {
        let faction = Faction::new(3, "The Iron Pact", false);
        assert!(faction.exists);
        assert!(!faction.quit);
        assert!(!faction.is_npc);
        assert!(faction.events.is_empty());
        assert!(faction.errors.is_empty());
    }

    #[test]
    fn diagnostics_accumulate_and_clear() {
        let mut faction = Faction::new(1, "f", false);
        faction.event("Taxes collected.");
        faction.error("No such unit.");
        assert_eq!(faction.events.len(), 1);
        assert_eq!(faction.errors.len(), 1);
        faction.clear_diagnostics();
        assert!(faction.events.is_empty());
        assert!(faction.errors.is_empty());
    }
}
