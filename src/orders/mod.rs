//! Order types for every turn phase.
//!
//! An [`Order`] is resolved during exactly one pipeline phase; a
//! [`MonthOrder`] occupies a unit for the whole month and lives in the
//! unit's single month-long slot. Instant orders (FORM, GUARD 0) never
//! appear here: the parser executes them while reading the file.

pub mod parser;

use serde::{Deserialize, Serialize};

use crate::game::item::{Item, Skill};
use crate::game::region::Direction;

/// An order resolved during one phase of the turn pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    /// `find <faction>`: report another faction's contact details.
    Find { faction: u32 },

    /// `enter <structure>`: move into a structure in the current region.
    Enter { structure: u32 },

    /// `leave`: step out of the current structure.
    Leave,

    /// `promote <unit>`: hand structure ownership to another occupant.
    Promote { target: u32 },

    /// `evict <unit>`: expel another occupant from an owned structure.
    Evict { target: u32 },

    /// `attack <unit>`: open combat against a unit in the same region.
    Attack { target: u32 },

    /// `steal <unit> <item>`: covertly take one item from a target.
    Steal { target: u32, item: Item },

    /// `assassinate <unit>`: covertly kill a lone target.
    Assassinate { target: u32 },

    /// `give <unit> <amount> <item>`: unconditional transfer. Target 0
    /// discards the goods.
    Give { target: u32, amount: i64, item: Item },

    /// `exchange <unit> <give-amt> <give-item> <want-amt> <want-item>`:
    /// bilateral trade that only settles if both offers match.
    Exchange {
        target: u32,
        give_amount: i64,
        give_item: Item,
        want_amount: i64,
        want_item: Item,
    },

    /// `destroy`: demolish the structure the unit owns.
    Destroy,

    /// `pillage`: extract regional wealth by force.
    Pillage,

    /// `tax`: collect regional taxes peacefully.
    Tax,

    /// `guard 1`: start guarding the region. (`guard 0` is instant.)
    Guard,

    /// `cast <spell> ...`: work magic.
    Cast { spell: Spell },

    /// `sell <amount> <item>`: sell to the region market.
    Sell { amount: i64, item: Item },

    /// `buy <amount> <item>`: buy from the region market.
    Buy { amount: i64, item: Item },

    /// `forget <skill>`: unlearn a skill.
    Forget { skill: Skill },

    /// `quit`: withdraw the whole faction from the game.
    Quit,

    /// `withdraw <amount> <item>`: draw goods from the faction's unclaimed
    /// reserve.
    Withdraw { amount: i64, item: Item },

    /// `teach <unit> ...`: spend the month teaching the listed students.
    Teach { students: Vec<u32> },
}

/// A month-long order; a unit holds at most one per turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonthOrder {
    /// Earn regional wages.
    Work,

    /// Study a skill.
    Study { skill: Skill },

    /// Produce an item from regional resources.
    Produce { item: Item },

    /// Walk along the listed exits, one region per step.
    Move { dirs: Vec<Direction> },

    /// Sail the owned ship along the listed exits.
    Sail { dirs: Vec<Direction> },
}

/// Spells castable via `cast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spell {
    /// Relocate the casting unit to a region at the teleport phase.
    Teleport { region: u32 },

    /// Scry a distant region into the faction report.
    Farsight { region: u32 },
}
