//! World data model: session, factions, regions, units, items.

pub mod faction;
pub mod item;
pub mod region;
pub mod session;
pub mod unit;

pub use faction::Faction;
pub use region::{Direction, Region, Structure, StructureKind, Terrain};
pub use session::{GameStatus, Session};
pub use unit::{TaxState, Unit};
