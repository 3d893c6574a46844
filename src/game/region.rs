//! Regions: the locations of the world graph.
//!
//! Regions hold units and structures in stable insertion order; region ids
//! ascend with creation order, and every pipeline loop iterates regions by
//! ascending id so turn resolution is deterministic.

use serde::{Deserialize, Serialize};

use crate::game::item::{Item, ItemStack};
use crate::game::unit::Unit;

/// A compass exit from a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// All directions, in exit-table order.
pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

impl Direction {
    pub const fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }

    /// Parses a direction from its keyword or single-letter shorthand.
    pub fn from_keyword(s: &str) -> Option<Direction> {
        match s.to_ascii_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "east" | "e" => Some(Direction::East),
            "south" | "s" => Some(Direction::South),
            "west" | "w" => Some(Direction::West),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    Plain,
    Forest,
    Mountain,
    Swamp,
    Ocean,
}

impl Terrain {
    pub const fn name(self) -> &'static str {
        match self {
            Terrain::Plain => "plain",
            Terrain::Forest => "forest",
            Terrain::Mountain => "mountain",
            Terrain::Swamp => "swamp",
            Terrain::Ocean => "ocean",
        }
    }

    /// The item this terrain yields to `produce` orders.
    pub const fn resource(self) -> Option<Item> {
        match self {
            Terrain::Plain => Some(Item::Grain),
            Terrain::Forest => Some(Item::Wood),
            Terrain::Mountain => Some(Item::Iron),
            Terrain::Swamp => None,
            Terrain::Ocean => None,
        }
    }
}

/// What a structure is; ships can put to sea, buildings cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureKind {
    Tower,
    Hall,
    Ship,
}

impl StructureKind {
    pub const fn is_ship(self) -> bool {
        matches!(self, StructureKind::Ship)
    }

    pub const fn name(self) -> &'static str {
        match self {
            StructureKind::Tower => "tower",
            StructureKind::Hall => "hall",
            StructureKind::Ship => "ship",
        }
    }
}

/// A building or ship inside a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub id: u32,
    pub name: String,
    pub kind: StructureKind,
    /// Unit number of the current owner, if any.
    pub owner: Option<u32>,
}

/// One line of a region's market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketItem {
    pub item: Item,
    pub price: i64,
    /// Stock available to buy this turn.
    pub amount: i64,
}

/// A location in the world graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: u32,
    pub name: String,
    pub terrain: Terrain,
    /// Neighboring region ids, indexed by [`Direction::index`].
    pub exits: [Option<u32>; 4],
    /// Taxable wealth in silver.
    pub wealth: i64,
    /// Monthly wage for `work` orders, per man.
    pub wages: i64,
    pub market: Vec<MarketItem>,
    /// Faction whose units guard this region, if any.
    pub guard_faction: Option<u32>,
    pub structures: Vec<Structure>,
    pub units: Vec<Unit>,
}

impl Region {
    pub fn new(id: u32, name: impl Into<String>, terrain: Terrain) -> Region {
        Region {
            id,
            name: name.into(),
            terrain,
            exits: [None; 4],
            wealth: 0,
            wages: 10,
            market: Vec::new(),
            guard_faction: None,
            structures: Vec::new(),
            units: Vec::new(),
        }
    }

    pub fn is_ocean(&self) -> bool {
        self.terrain == Terrain::Ocean
    }

    pub fn exit(&self, dir: Direction) -> Option<u32> {
        self.exits[dir.index()]
    }

    pub fn unit(&self, num: u32) -> Option<&Unit> {
        self.units.iter().find(|u| u.num == num)
    }

    pub fn unit_mut(&mut self, num: u32) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.num == num)
    }

    /// Detaches a unit from the region, preserving the order of the rest.
    pub fn take_unit(&mut self, num: u32) -> Option<Unit> {
        let idx = self.units.iter().position(|u| u.num == num)?;
        Some(self.units.remove(idx))
    }

    pub fn structure(&self, id: u32) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id == id)
    }

    pub fn structure_mut(&mut self, id: u32) -> Option<&mut Structure> {
        self.structures.iter_mut().find(|s| s.id == id)
    }

    /// Men aboard or inside a structure.
    pub fn structure_men(&self, id: u32) -> i64 {
        self.units
            .iter()
            .filter(|u| u.structure == Some(id))
            .map(|u| u.men)
            .sum()
    }

    pub fn market_line(&self, item: Item) -> Option<&MarketItem> {
        self.market.iter().find(|m| m.item == item)
    }

    pub fn market_line_mut(&mut self, item: Item) -> Option<&mut MarketItem> {
        self.market.iter_mut().find(|m| m.item == item)
    }

    /// Stock an item for sale, merging with an existing market line.
    pub fn stock_market(&mut self, item: Item, amount: i64) {
        match self.market_line_mut(item) {
            Some(line) => line.amount += amount,
            None => self.market.push(MarketItem {
                item,
                price: item.base_price(),
                amount,
            }),
        }
    }
}
